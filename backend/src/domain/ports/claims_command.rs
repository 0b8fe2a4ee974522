//! Driving port for claim synchronization and account removal.

use async_trait::async_trait;

use crate::domain::{CustomClaims, Error, Principal, ProvisioningState, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClaimsCommand: Send + Sync {
    /// Mirror the target's stored role into the provider's custom claims.
    ///
    /// Returns the claims now held, or `None` when they were cleared.
    async fn set_claims(
        &self,
        caller: &Principal,
        target: &UserId,
    ) -> Result<Option<CustomClaims>, Error>;

    /// Delete the target's user document and provider account.
    async fn delete_user(&self, caller: &Principal, target: &UserId) -> Result<(), Error>;

    /// Report where the account sits in the provisioning lifecycle.
    async fn provisioning_state(&self, uid: &UserId) -> Result<ProvisioningState, Error>;
}
