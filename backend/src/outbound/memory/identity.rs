//! Identity provider held in process memory.
//!
//! Accounts and the tokens that assert them are registered up front. Used
//! for local development without provider credentials and by the
//! integration tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::domain::ports::{IdToken, IdentityProvider, IdentityProviderError, VerifiedIdentity};
use crate::domain::{CustomClaims, EmailAddress, UserId};

#[derive(Debug, Clone)]
struct Account {
    email: Option<EmailAddress>,
    display_name: Option<String>,
    claims: Option<CustomClaims>,
}

#[derive(Debug, Default)]
struct Accounts {
    by_uid: BTreeMap<UserId, Account>,
    tokens: BTreeMap<String, UserId>,
}

/// In-memory [`IdentityProvider`].
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    accounts: RwLock<Accounts>,
}

impl InMemoryIdentityProvider {
    /// Create a provider with no accounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account and the token that signs it in.
    pub async fn register(
        &self,
        token: impl Into<String>,
        uid: UserId,
        email: Option<EmailAddress>,
        display_name: Option<String>,
    ) {
        let mut accounts = self.accounts.write().await;
        accounts.tokens.insert(token.into(), uid.clone());
        accounts.by_uid.insert(
            uid,
            Account {
                email,
                display_name,
                claims: None,
            },
        );
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn verify_id_token(
        &self,
        token: &IdToken,
    ) -> Result<VerifiedIdentity, IdentityProviderError> {
        let accounts = self.accounts.read().await;
        let uid = accounts
            .tokens
            .get(token.expose())
            .ok_or_else(|| IdentityProviderError::invalid_token("unknown token"))?;
        let account = accounts
            .by_uid
            .get(uid)
            .ok_or_else(|| IdentityProviderError::invalid_token("account was deleted"))?;
        Ok(VerifiedIdentity {
            uid: uid.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone(),
        })
    }

    async fn custom_claims(
        &self,
        uid: &UserId,
    ) -> Result<Option<CustomClaims>, IdentityProviderError> {
        self.accounts
            .read()
            .await
            .by_uid
            .get(uid)
            .map(|account| account.claims)
            .ok_or_else(|| IdentityProviderError::unknown_account(uid.as_ref()))
    }

    async fn set_custom_claims(
        &self,
        uid: &UserId,
        claims: Option<CustomClaims>,
    ) -> Result<(), IdentityProviderError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts
            .by_uid
            .get_mut(uid)
            .ok_or_else(|| IdentityProviderError::unknown_account(uid.as_ref()))?;
        debug!(%uid, ?claims, "custom claims replaced");
        account.claims = claims;
        Ok(())
    }

    async fn delete_account(&self, uid: &UserId) -> Result<bool, IdentityProviderError> {
        let mut accounts = self.accounts.write().await;
        accounts.tokens.retain(|_, owner| owner != uid);
        Ok(accounts.by_uid.remove(uid).is_some())
    }
}
