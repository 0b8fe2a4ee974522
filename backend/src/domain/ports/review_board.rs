//! Driving port for reviews.

use async_trait::async_trait;

use crate::domain::{
    Error, LiveFeed, OrganizationId, Principal, Review, ReviewDetail, ReviewDraft, ReviewId,
    ReviewRecord,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewBoard: Send + Sync {
    /// Reviews of an organization, newest first, redacted for `viewer`.
    async fn list_for_organization(
        &self,
        viewer: &Principal,
        organization: &OrganizationId,
    ) -> Result<Vec<Review>, Error>;

    /// Follow an organization's reviews as they change, redacted for
    /// `viewer`.
    async fn watch(
        &self,
        viewer: &Principal,
        organization: &OrganizationId,
    ) -> Result<LiveFeed<Review>, Error>;

    /// One review with its address and display labels, redacted for
    /// `viewer`.
    async fn get(&self, viewer: &Principal, id: &ReviewId) -> Result<ReviewDetail, Error>;

    /// Submit a review authored by `viewer`.
    async fn create(
        &self,
        viewer: &Principal,
        organization: &OrganizationId,
        draft: ReviewDraft,
    ) -> Result<ReviewRecord, Error>;

    /// Edit a review; authors and administrators only.
    async fn update(
        &self,
        viewer: &Principal,
        id: &ReviewId,
        draft: ReviewDraft,
    ) -> Result<ReviewRecord, Error>;

    /// Delete a review; authors and administrators only.
    async fn delete(&self, viewer: &Principal, id: &ReviewId) -> Result<(), Error>;

    /// Delete every review of an organization; administrators only.
    async fn delete_for_organization(
        &self,
        caller: &Principal,
        organization: &OrganizationId,
    ) -> Result<u64, Error>;
}
