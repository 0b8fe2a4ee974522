//! Port for review persistence.

use async_trait::async_trait;

use crate::domain::{OrganizationId, Review, ReviewChangeSet, ReviewId, ReviewRecord};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by review adapters.
    pub enum ReviewPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "review repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "review repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewRepository: Send + Sync {
    /// Reviews of one organization, newest first.
    async fn list_for_organization(
        &self,
        organization: &OrganizationId,
    ) -> Result<Vec<Review>, ReviewPersistenceError>;

    /// Fetch a review with its address.
    async fn find(&self, id: &ReviewId) -> Result<Option<ReviewRecord>, ReviewPersistenceError>;

    /// Write a review and its address atomically.
    async fn save(&self, changes: &ReviewChangeSet) -> Result<(), ReviewPersistenceError>;

    /// Delete a review and its address.
    async fn delete(&self, id: &ReviewId) -> Result<bool, ReviewPersistenceError>;

    /// Delete every review of an organization in one transaction.
    async fn delete_for_organization(
        &self,
        organization: &OrganizationId,
    ) -> Result<u64, ReviewPersistenceError>;

    /// Total number of reviews.
    async fn count(&self) -> Result<u64, ReviewPersistenceError>;
}
