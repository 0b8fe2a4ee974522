//! Administrator-facing user and invitation management.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::claims_sync::{map_allow_list_error, map_user_error};
use crate::domain::live_list::{LiveFeed, LiveList};
use crate::domain::ports::{
    AllowListRepository, ClaimsCommand, InvitationRequest, UserAdministration, UserRepository,
    UserUpdate,
};
use crate::domain::{
    AllowListEntry, EmailAddress, Error, InstitutionDomain, Principal, User, UserId,
};

/// Domain service implementing [`UserAdministration`].
///
/// Successful writes are mirrored into the `users` and `invitations` live
/// lists that administrators follow. Users provisioned by a first sign-in
/// show up when the next feed is opened.
#[derive(Clone)]
pub struct UserAdminService<U, A, C> {
    users: Arc<U>,
    allow_list: Arc<A>,
    claims: Arc<C>,
    institution: InstitutionDomain,
    clock: Arc<dyn Clock>,
    users_live: LiveList<User>,
    invitations_live: LiveList<AllowListEntry>,
}

impl<U, A, C> UserAdminService<U, A, C> {
    /// Create the service.
    pub fn new(
        users: Arc<U>,
        allow_list: Arc<A>,
        claims: Arc<C>,
        institution: InstitutionDomain,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            allow_list,
            claims,
            institution,
            clock,
            users_live: LiveList::default(),
            invitations_live: LiveList::default(),
        }
    }
}

#[async_trait]
impl<U, A, C> UserAdministration for UserAdminService<U, A, C>
where
    U: UserRepository,
    A: AllowListRepository,
    C: ClaimsCommand,
{
    async fn list_users(&self, caller: &Principal) -> Result<Vec<User>, Error> {
        caller.require_admin()?;
        let users = self.users.list().await.map_err(map_user_error)?;
        self.users_live.replace(users.clone());
        Ok(users)
    }

    async fn watch_users(&self, caller: &Principal) -> Result<LiveFeed<User>, Error> {
        caller.require_admin()?;
        let feed = self.users_live.unfiltered_feed();
        let users = self.users.list().await.map_err(map_user_error)?;
        self.users_live.replace(users);
        Ok(feed)
    }

    async fn invite(
        &self,
        caller: &Principal,
        request: InvitationRequest,
    ) -> Result<AllowListEntry, Error> {
        caller.require_admin()?;
        let InvitationRequest { email, role, name } = request;
        if !self.institution.admits(&email) {
            return Err(Error::permission_denied(format!(
                "only {} addresses may be invited",
                self.institution
            )));
        }
        if let Some(existing) = self
            .users
            .find_by_email(&email)
            .await
            .map_err(map_user_error)?
        {
            return Err(Error::conflict(format!(
                "{email} already belongs to user {}",
                existing.id
            )));
        }

        let entry = AllowListEntry {
            email,
            role,
            name: name
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty()),
            invited_at: self.clock.utc(),
        };
        self.allow_list
            .upsert(&entry)
            .await
            .map_err(map_allow_list_error)?;
        info!(
            email = %entry.email,
            role = %entry.role,
            invited_by = %caller.user_id,
            "invitation stored"
        );
        self.invitations_live.upsert(entry.clone());
        Ok(entry)
    }

    async fn list_invitations(&self, caller: &Principal) -> Result<Vec<AllowListEntry>, Error> {
        caller.require_admin()?;
        let entries = self.allow_list.list().await.map_err(map_allow_list_error)?;
        self.invitations_live.replace(entries.clone());
        Ok(entries)
    }

    async fn watch_invitations(
        &self,
        caller: &Principal,
    ) -> Result<LiveFeed<AllowListEntry>, Error> {
        caller.require_admin()?;
        let feed = self.invitations_live.unfiltered_feed();
        let entries = self.allow_list.list().await.map_err(map_allow_list_error)?;
        self.invitations_live.replace(entries);
        Ok(feed)
    }

    async fn revoke_invitation(
        &self,
        caller: &Principal,
        email: &EmailAddress,
    ) -> Result<(), Error> {
        caller.require_admin()?;
        if !self
            .allow_list
            .remove(email)
            .await
            .map_err(map_allow_list_error)?
        {
            return Err(Error::not_found(format!("no invitation for {email}")));
        }
        self.invitations_live.remove(email);
        Ok(())
    }

    async fn update_user(
        &self,
        caller: &Principal,
        id: &UserId,
        update: UserUpdate,
    ) -> Result<User, Error> {
        caller.require_admin()?;
        let updated = self
            .users
            .update_profile(id, &update.email, update.role)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(format!("no user {id}")))?;
        self.claims.set_claims(caller, id).await?;
        info!(uid = %id, role = %updated.role, "user profile updated");
        self.users_live.patch(id, |user| {
            user.email = updated.email.clone();
            user.role = updated.role;
        });
        Ok(updated)
    }

    async fn delete_user(&self, caller: &Principal, id: &UserId) -> Result<(), Error> {
        self.claims.delete_user(caller, id).await?;
        self.users_live.remove(id);
        Ok(())
    }
}
