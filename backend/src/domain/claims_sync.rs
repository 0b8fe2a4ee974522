//! Claims synchronizer.
//!
//! Keeps three stores consistent: the invitation allow-list, the user
//! documents and the identity provider's custom claims. Account creation
//! consumes an invitation, sign-in bumps the access counter, and
//! [`ClaimsSynchronizer::set_claims`] mirrors a stored role into claims.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    AccountCreationEvent, AllowListPersistenceError, AllowListRepository, ClaimsCommand,
    IdentityHooks, IdentityProvider, IdentityProviderError, ProvisionOutcome, SignInEvent,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    CustomClaims, EmailAddress, Error, InstitutionDomain, Principal, ProvisioningState, User,
    UserId,
};

/// Domain service implementing the identity hooks and claim commands.
#[derive(Clone)]
pub struct ClaimsSynchronizer<U, A, P> {
    users: Arc<U>,
    allow_list: Arc<A>,
    identity: Arc<P>,
    institution: InstitutionDomain,
    clock: Arc<dyn Clock>,
}

impl<U, A, P> ClaimsSynchronizer<U, A, P> {
    /// Create a synchronizer admitting accounts from `institution`.
    pub fn new(
        users: Arc<U>,
        allow_list: Arc<A>,
        identity: Arc<P>,
        institution: InstitutionDomain,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            allow_list,
            identity,
            institution,
            clock,
        }
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, Error> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::invalid_argument(format!("{field} is required")))
}

fn parse_email(raw: Option<&str>) -> Result<EmailAddress, Error> {
    EmailAddress::new(required(raw, "email")?)
        .map_err(|err| Error::invalid_argument(err.to_string()))
}

fn parse_uid(raw: Option<&str>) -> Result<UserId, Error> {
    UserId::new(required(raw, "uid")?).map_err(|err| Error::invalid_argument(err.to_string()))
}

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    warn!(%error, "user repository failure");
    match error {
        UserPersistenceError::Connection { message } => {
            Error::unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { email } => {
            Error::conflict(format!("email {email} belongs to another user"))
        }
    }
}

pub(crate) fn map_allow_list_error(error: AllowListPersistenceError) -> Error {
    warn!(%error, "allow-list failure");
    match error {
        AllowListPersistenceError::Connection { message } => {
            Error::unavailable(format!("allow-list unavailable: {message}"))
        }
        AllowListPersistenceError::Query { message } => {
            Error::internal(format!("allow-list error: {message}"))
        }
    }
}

pub(crate) fn map_identity_error(error: IdentityProviderError) -> Error {
    warn!(%error, "identity provider failure");
    match error {
        IdentityProviderError::Transport { message } => {
            Error::unavailable(format!("identity provider unavailable: {message}"))
        }
        IdentityProviderError::InvalidToken { message } => {
            Error::unauthenticated(format!("identity token rejected: {message}"))
        }
        IdentityProviderError::UnknownAccount { uid } => {
            Error::not_found(format!("no account exists for {uid}"))
        }
        IdentityProviderError::Rejected { message } => {
            Error::internal(format!("identity provider rejected the request: {message}"))
        }
    }
}

impl<U, A, P> ClaimsSynchronizer<U, A, P>
where
    U: UserRepository,
    A: AllowListRepository,
    P: IdentityProvider,
{
    fn resolve_name(seed: Option<&str>, display_name: Option<&str>) -> String {
        seed.or_else(|| {
            display_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
        })
        .map(str::to_owned)
        .unwrap_or_default()
    }

    async fn claims_or_none(&self, uid: &UserId) -> Result<Option<CustomClaims>, Error> {
        match self.identity.custom_claims(uid).await {
            Ok(claims) => Ok(claims),
            Err(IdentityProviderError::UnknownAccount { .. }) => Ok(None),
            Err(error) => Err(map_identity_error(error)),
        }
    }
}

#[async_trait]
impl<U, A, P> IdentityHooks for ClaimsSynchronizer<U, A, P>
where
    U: UserRepository,
    A: AllowListRepository,
    P: IdentityProvider,
{
    async fn on_create(&self, event: AccountCreationEvent) -> Result<User, Error> {
        let email = parse_email(event.email.as_deref())?;
        let uid = parse_uid(event.uid.as_deref())?;

        if !self.institution.admits(&email) {
            warn!(%email, institution = %self.institution, "account creation outside institution");
            return Err(Error::permission_denied(format!(
                "unauthorized email {email}; only {} addresses may register",
                self.institution
            )));
        }

        let entry = self
            .allow_list
            .find(&email)
            .await
            .map_err(map_allow_list_error)?
            .ok_or_else(|| {
                info!(%email, "account creation without invitation");
                Error::not_found(format!("{email} has not been invited"))
            })?;

        let user = User {
            id: uid,
            name: Self::resolve_name(entry.seed_name(), event.display_name.as_deref()),
            email,
            role: entry.role,
            created_at: self.clock.utc(),
            last_access_at: None,
            access_count: 0,
        };

        match self
            .allow_list
            .provision(&user)
            .await
            .map_err(map_allow_list_error)?
        {
            ProvisionOutcome::Provisioned(user) => {
                info!(uid = %user.id, role = %user.role, "user provisioned");
                Ok(user)
            }
            ProvisionOutcome::NoInvitation => {
                info!(email = %user.email, "invitation consumed concurrently");
                Err(Error::not_found(format!(
                    "{} has not been invited",
                    user.email
                )))
            }
        }
    }

    async fn on_sign_in(&self, event: SignInEvent) -> Result<User, Error> {
        required(event.email.as_deref(), "email")?;
        let uid = parse_uid(event.uid.as_deref())?;

        let user = self
            .users
            .record_access(&uid, self.clock.utc())
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(format!("no user document for {uid}")))?;
        debug!(uid = %user.id, count = user.access_count, "sign-in recorded");
        Ok(user)
    }
}

#[async_trait]
impl<U, A, P> ClaimsCommand for ClaimsSynchronizer<U, A, P>
where
    U: UserRepository,
    A: AllowListRepository,
    P: IdentityProvider,
{
    async fn set_claims(
        &self,
        caller: &Principal,
        target: &UserId,
    ) -> Result<Option<CustomClaims>, Error> {
        if caller.user_id != *target && !caller.is_admin() {
            return Err(Error::permission_denied(
                "only administrators may synchronise another user's claims",
            ));
        }

        let user = self
            .users
            .find_by_id(target)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(format!("no user document for {target}")))?;

        let claims = CustomClaims::for_role(user.role);
        self.identity
            .set_custom_claims(target, claims)
            .await
            .map_err(map_identity_error)?;
        debug!(uid = %target, role = %user.role, "custom claims synchronised");
        Ok(claims)
    }

    async fn delete_user(&self, caller: &Principal, target: &UserId) -> Result<(), Error> {
        caller.require_admin()?;

        let document_removed = self.users.delete(target).await.map_err(map_user_error)?;
        let account_removed = match self.identity.delete_account(target).await {
            Ok(removed) => removed,
            Err(IdentityProviderError::UnknownAccount { .. }) => false,
            Err(error) => return Err(map_identity_error(error)),
        };
        info!(
            uid = %target,
            document_removed,
            account_removed,
            "user deleted"
        );
        Ok(())
    }

    async fn provisioning_state(&self, uid: &UserId) -> Result<ProvisioningState, Error> {
        let Some(user) = self.users.find_by_id(uid).await.map_err(map_user_error)? else {
            return Ok(ProvisioningState::Unprovisioned);
        };
        let claims = self.claims_or_none(uid).await?;
        Ok(ProvisioningState::resolve(Some(user.role), claims))
    }
}

#[cfg(test)]
#[path = "claims_sync_tests.rs"]
mod tests;
