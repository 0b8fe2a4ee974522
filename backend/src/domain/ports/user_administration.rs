//! Driving port for the administrators' user and invitation screens.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    AllowListEntry, EmailAddress, Error, LiveFeed, Principal, Role, User, UserId,
};

/// Invitation form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvitationRequest {
    pub email: EmailAddress,
    /// Role granted on first sign-in; students by default.
    #[serde(default = "default_invited_role")]
    pub role: Role,
    #[serde(default)]
    pub name: Option<String>,
}

const fn default_invited_role() -> Role {
    Role::Student
}

/// Profile edit applied by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub email: EmailAddress,
    pub role: Role,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserAdministration: Send + Sync {
    /// Every user ordered by name.
    async fn list_users(&self, caller: &Principal) -> Result<Vec<User>, Error>;

    /// Follow the user list as it changes.
    async fn watch_users(&self, caller: &Principal) -> Result<LiveFeed<User>, Error>;

    /// Invite an institutional email address.
    async fn invite(
        &self,
        caller: &Principal,
        request: InvitationRequest,
    ) -> Result<AllowListEntry, Error>;

    /// Pending invitations ordered by email.
    async fn list_invitations(&self, caller: &Principal) -> Result<Vec<AllowListEntry>, Error>;

    /// Follow pending invitations as they change.
    async fn watch_invitations(&self, caller: &Principal)
    -> Result<LiveFeed<AllowListEntry>, Error>;

    /// Withdraw a pending invitation.
    async fn revoke_invitation(&self, caller: &Principal, email: &EmailAddress)
    -> Result<(), Error>;

    /// Change a user's email and role, then bring their claims in line.
    async fn update_user(
        &self,
        caller: &Principal,
        id: &UserId,
        update: UserUpdate,
    ) -> Result<User, Error>;

    /// Remove a user document and account.
    async fn delete_user(&self, caller: &Principal, id: &UserId) -> Result<(), Error>;
}
