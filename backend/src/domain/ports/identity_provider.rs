//! Port for the external identity provider.
//!
//! The provider owns accounts, verifies ID tokens and stores the custom
//! claims that carry each user's role.

use std::fmt;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::{CustomClaims, EmailAddress, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by identity provider adapters.
    pub enum IdentityProviderError {
        /// The provider could not be reached or answered with a server error.
        Transport { message: String } => "identity provider unreachable: {message}",
        /// The presented ID token is invalid or expired.
        InvalidToken { message: String } => "identity token rejected: {message}",
        /// The provider has no account with this id.
        UnknownAccount { uid: String } => "identity provider has no account {uid}",
        /// The provider refused the request.
        Rejected { message: String } => "identity provider rejected the request: {message}",
    }
}

/// Raw ID token presented by a client; wiped from memory on drop.
#[derive(Clone)]
pub struct IdToken(Zeroizing<String>);

impl IdToken {
    /// Wrap a token string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Borrow the token.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the token is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for IdToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdToken(<redacted>)")
    }
}

/// Identity asserted by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: UserId,
    pub email: Option<EmailAddress>,
    pub display_name: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify an ID token and return the identity it asserts.
    async fn verify_id_token(
        &self,
        token: &IdToken,
    ) -> Result<VerifiedIdentity, IdentityProviderError>;

    /// Read the account's current custom claims, bypassing any cache.
    async fn custom_claims(
        &self,
        uid: &UserId,
    ) -> Result<Option<CustomClaims>, IdentityProviderError>;

    /// Replace the account's custom claims; `None` clears them.
    async fn set_custom_claims(
        &self,
        uid: &UserId,
        claims: Option<CustomClaims>,
    ) -> Result<(), IdentityProviderError>;

    /// Delete the account, reporting whether it existed.
    async fn delete_account(&self, uid: &UserId) -> Result<bool, IdentityProviderError>;
}
