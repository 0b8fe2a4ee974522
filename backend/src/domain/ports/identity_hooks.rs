//! Driving port for the identity provider's blocking hooks.
//!
//! The provider calls these before it creates an account and before it
//! completes a sign-in. An error aborts the provider-side operation.

use async_trait::async_trait;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::{Error, User};

/// Payload of the before-create hook.
///
/// Fields are optional on the wire; the synchronizer reports missing ones as
/// `invalid-argument`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountCreationEvent {
    pub email: Option<String>,
    pub uid: Option<String>,
    pub display_name: Option<String>,
}

/// Payload of the before-sign-in hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInEvent {
    pub email: Option<String>,
    pub uid: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityHooks: Send + Sync {
    /// Provision the user document for a newly created account.
    async fn on_create(&self, event: AccountCreationEvent) -> Result<User, Error>;

    /// Record a sign-in against an existing user document.
    async fn on_sign_in(&self, event: SignInEvent) -> Result<User, Error>;
}
