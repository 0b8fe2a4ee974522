//! Reviews of organizations.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::live_list::{LiveFeed, LiveLists};
use crate::domain::organization_service::map_organization_error;
use crate::domain::ports::{
    OrganizationRepository, ReviewBoard, ReviewPersistenceError, ReviewRepository,
};
use crate::domain::reference_cache::ReferenceCache;
use crate::domain::{
    Error, Organization, OrganizationId, Principal, ReferenceTable, Review, ReviewChangeSet,
    ReviewDraft, ReviewId, ReviewRecord, ReviewValidationError,
};

/// Display labels resolved from the reference tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewLabels {
    pub region: String,
    pub languages: Vec<String>,
    pub sectors: Vec<String>,
    pub address_country: String,
}

/// Review record decorated for display.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewDetail {
    #[serde(flatten)]
    pub record: ReviewRecord,
    pub labels: ReviewLabels,
}

pub(crate) fn map_review_error(error: ReviewPersistenceError) -> Error {
    warn!(%error, "review repository failure");
    match error {
        ReviewPersistenceError::Connection { message } => {
            Error::unavailable(format!("review repository unavailable: {message}"))
        }
        ReviewPersistenceError::Query { message } => {
            Error::internal(format!("review repository error: {message}"))
        }
    }
}

fn map_validation_error(error: &ReviewValidationError) -> Error {
    Error::invalid_argument(error.to_string()).with_details(json!({ "field": error.field() }))
}

fn review_not_found(id: &ReviewId) -> Error {
    Error::not_found(format!("review {id} not found"))
}

fn organization_not_found(id: &OrganizationId) -> Error {
    Error::not_found(format!("organization {id} not found"))
}

/// Domain service implementing [`ReviewBoard`].
///
/// Every review leaving the service is redacted for its reader. Live lists
/// are kept per watched organization and hold reviews as stored; each
/// subscriber's feed redacts them for that subscriber.
#[derive(Clone)]
pub struct ReviewService<V, O> {
    reviews: Arc<V>,
    organizations: Arc<O>,
    reference: Arc<ReferenceCache>,
    clock: Arc<dyn Clock>,
    live: LiveLists<OrganizationId, Review>,
}

impl<V, O> ReviewService<V, O> {
    /// Create the service.
    pub fn new(
        reviews: Arc<V>,
        organizations: Arc<O>,
        reference: Arc<ReferenceCache>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reviews,
            organizations,
            reference,
            clock,
            live: LiveLists::default(),
        }
    }

    fn labels(&self, record: &ReviewRecord) -> ReviewLabels {
        let content = &record.review.content;
        let other_sector = content.other_sector.as_deref();
        ReviewLabels {
            region: self.reference.label_with_other(
                ReferenceTable::Regions,
                content.region.as_deref(),
                content.other_region.as_deref(),
            ),
            languages: content
                .languages
                .iter()
                .map(|code| self.reference.label(ReferenceTable::Languages, code))
                .collect(),
            sectors: content
                .sectors
                .iter()
                .map(|code| {
                    self.reference
                        .label_with_other(ReferenceTable::Sectors, Some(code), other_sector)
                })
                .collect(),
            address_country: self.reference.optional_label(
                ReferenceTable::Countries,
                record
                    .address
                    .as_ref()
                    .and_then(|address| address.country.as_deref()),
            ),
        }
    }

    fn ensure_can_edit(viewer: &Principal, review: &Review) -> Result<(), Error> {
        viewer.require_member()?;
        if viewer.is_admin() || review.is_authored_by(viewer) {
            Ok(())
        } else {
            Err(Error::permission_denied(
                "only the author or an administrator may change a review",
            ))
        }
    }
}

impl<V, O> ReviewService<V, O>
where
    V: ReviewRepository,
    O: OrganizationRepository,
{
    /// Organization as `viewer` may see it; unapproved ones are hidden from
    /// students.
    async fn visible_organization(
        &self,
        viewer: &Principal,
        id: &OrganizationId,
    ) -> Result<Organization, Error> {
        let organization = self
            .organizations
            .find(id)
            .await
            .map_err(map_organization_error)?
            .ok_or_else(|| organization_not_found(id))?
            .organization;
        if organization.approved || viewer.is_admin() {
            Ok(organization)
        } else {
            Err(organization_not_found(id))
        }
    }

    async fn find_existing(&self, id: &ReviewId) -> Result<ReviewRecord, Error> {
        self.reviews
            .find(id)
            .await
            .map_err(map_review_error)?
            .ok_or_else(|| review_not_found(id))
    }

    async fn save(
        &self,
        viewer: &Principal,
        changes: ReviewChangeSet,
    ) -> Result<ReviewRecord, Error> {
        self.reviews.save(&changes).await.map_err(map_review_error)?;
        let ReviewRecord { review, address } = changes.record;
        self.live
            .reconcile(&review.organization, |list| list.upsert(review.clone()));
        Ok(ReviewRecord {
            review: review.redacted_for(viewer),
            address,
        })
    }
}

#[async_trait]
impl<V, O> ReviewBoard for ReviewService<V, O>
where
    V: ReviewRepository,
    O: OrganizationRepository,
{
    async fn list_for_organization(
        &self,
        viewer: &Principal,
        organization: &OrganizationId,
    ) -> Result<Vec<Review>, Error> {
        viewer.require_member()?;
        self.visible_organization(viewer, organization).await?;
        Ok(self
            .reviews
            .list_for_organization(organization)
            .await
            .map_err(map_review_error)?
            .into_iter()
            .map(|review| review.redacted_for(viewer))
            .collect())
    }

    async fn watch(
        &self,
        viewer: &Principal,
        organization: &OrganizationId,
    ) -> Result<LiveFeed<Review>, Error> {
        viewer.require_member()?;
        self.visible_organization(viewer, organization).await?;
        let reader = viewer.clone();
        let (list, feed) = self.live.subscribe(organization, move |review: &Review| {
            Some(review.clone().redacted_for(&reader))
        });
        let reviews = self
            .reviews
            .list_for_organization(organization)
            .await
            .map_err(map_review_error)?;
        list.replace(reviews);
        Ok(feed)
    }

    async fn get(&self, viewer: &Principal, id: &ReviewId) -> Result<ReviewDetail, Error> {
        viewer.require_member()?;
        let ReviewRecord { review, address } = self.find_existing(id).await?;
        if !viewer.is_admin() {
            self.visible_organization(viewer, &review.organization)
                .await
                .map_err(|_| review_not_found(id))?;
        }
        let record = ReviewRecord {
            review: review.redacted_for(viewer),
            address,
        };
        self.reference.ensure_loaded().await;
        let labels = self.labels(&record);
        Ok(ReviewDetail { record, labels })
    }

    async fn create(
        &self,
        viewer: &Principal,
        organization: &OrganizationId,
        draft: ReviewDraft,
    ) -> Result<ReviewRecord, Error> {
        viewer.require_member()?;
        let target = self
            .organizations
            .find(organization)
            .await
            .map_err(map_organization_error)?
            .ok_or_else(|| organization_not_found(organization))?;
        if !target.organization.approved && !viewer.is_admin() {
            return Err(Error::permission_denied(
                "only approved organizations can be reviewed",
            ));
        }
        let changes = ReviewChangeSet::create(*organization, viewer, draft, self.clock.utc())
            .map_err(|error| map_validation_error(&error))?;
        let id = changes.record.review.id;
        let record = self.save(viewer, changes).await?;
        info!(%id, %organization, "review created");
        Ok(record)
    }

    async fn update(
        &self,
        viewer: &Principal,
        id: &ReviewId,
        draft: ReviewDraft,
    ) -> Result<ReviewRecord, Error> {
        viewer.require_member()?;
        let existing = self.find_existing(id).await?;
        Self::ensure_can_edit(viewer, &existing.review)?;
        let changes = ReviewChangeSet::update(&existing.review, draft)
            .map_err(|error| map_validation_error(&error))?;
        let address_removed = changes.removed_address.is_some();
        let record = self.save(viewer, changes).await?;
        info!(%id, address_removed, "review updated");
        Ok(record)
    }

    async fn delete(&self, viewer: &Principal, id: &ReviewId) -> Result<(), Error> {
        viewer.require_member()?;
        let existing = self.find_existing(id).await?;
        Self::ensure_can_edit(viewer, &existing.review)?;
        if !self.reviews.delete(id).await.map_err(map_review_error)? {
            return Err(review_not_found(id));
        }
        info!(%id, "review deleted");
        self.live
            .reconcile(&existing.review.organization, |list| {
                list.remove(id);
            });
        Ok(())
    }

    async fn delete_for_organization(
        &self,
        caller: &Principal,
        organization: &OrganizationId,
    ) -> Result<u64, Error> {
        caller.require_admin()?;
        let removed = self
            .reviews
            .delete_for_organization(organization)
            .await
            .map_err(map_review_error)?;
        info!(%organization, removed, "organization reviews deleted");
        self.live
            .reconcile(organization, |list| list.replace(Vec::new()));
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "review_service_tests.rs"]
mod tests;
