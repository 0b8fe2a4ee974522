//! Driving port for organization browsing and administration.

use async_trait::async_trait;

use crate::domain::{
    Error, LiveFeed, Organization, OrganizationDetail, OrganizationDraft, OrganizationFilter,
    OrganizationId, OrganizationRecord, Principal,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationDirectory: Send + Sync {
    /// Organizations visible to `viewer`, ordered by name.
    async fn list(&self, viewer: &Principal) -> Result<Vec<Organization>, Error>;

    /// Follow the organizations visible to `viewer` as they change.
    async fn watch(&self, viewer: &Principal) -> Result<LiveFeed<Organization>, Error>;

    /// Visible organizations passing `filter`.
    async fn filter(
        &self,
        viewer: &Principal,
        filter: &OrganizationFilter,
    ) -> Result<Vec<Organization>, Error>;

    /// One organization with its address, contacts and display labels.
    async fn get(&self, viewer: &Principal, id: &OrganizationId)
    -> Result<OrganizationDetail, Error>;

    /// Create an unapproved organization.
    async fn create(
        &self,
        caller: &Principal,
        draft: OrganizationDraft,
    ) -> Result<OrganizationRecord, Error>;

    /// Replace an organization's fields, address and contacts.
    async fn update(
        &self,
        caller: &Principal,
        id: &OrganizationId,
        draft: OrganizationDraft,
    ) -> Result<OrganizationRecord, Error>;

    /// Approve or withdraw approval.
    async fn set_approval(
        &self,
        caller: &Principal,
        id: &OrganizationId,
        approved: bool,
    ) -> Result<Organization, Error>;

    /// Delete an organization; its reviews are kept.
    async fn delete(&self, caller: &Principal, id: &OrganizationId) -> Result<(), Error>;
}
