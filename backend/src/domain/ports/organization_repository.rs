//! Port for organization composites.
//!
//! Adapters persist an organization together with its address and contacts;
//! [`OrganizationRepository::save`] applies a whole change set or nothing.

use async_trait::async_trait;

use crate::domain::{Organization, OrganizationChangeSet, OrganizationId, OrganizationRecord};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by organization adapters.
    pub enum OrganizationPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "organization repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "organization repository query failed: {message}",
    }
}

/// Which organizations a listing includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganizationScope {
    All,
    ApprovedOnly,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Organizations in `scope`, ordered by name.
    async fn list(
        &self,
        scope: OrganizationScope,
    ) -> Result<Vec<Organization>, OrganizationPersistenceError>;

    /// Fetch an organization with its address and contacts.
    async fn find(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationRecord>, OrganizationPersistenceError>;

    /// Apply a change set atomically and return the stored organization.
    ///
    /// Editing an existing organization keeps its stored approval flag and
    /// creation time.
    async fn save(
        &self,
        changes: &OrganizationChangeSet,
    ) -> Result<Organization, OrganizationPersistenceError>;

    /// Set the approval flag, returning the updated organization.
    async fn set_approval(
        &self,
        id: &OrganizationId,
        approved: bool,
    ) -> Result<Option<Organization>, OrganizationPersistenceError>;

    /// Delete an organization with its address and contacts. Reviews are kept.
    async fn delete(&self, id: &OrganizationId) -> Result<bool, OrganizationPersistenceError>;

    /// Number of organizations with the given approval flag.
    async fn count(&self, approved: bool) -> Result<u64, OrganizationPersistenceError>;
}
