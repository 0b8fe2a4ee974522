//! Organization browsing and administration.
//!
//! Students only ever see approved organizations; unapproved ones answer
//! `not-found` so their existence is not disclosed.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::live_list::{LiveFeed, LiveList};
use crate::domain::ports::{
    OrganizationDirectory, OrganizationPersistenceError, OrganizationRepository,
    OrganizationScope,
};
use crate::domain::reference_cache::ReferenceCache;
use crate::domain::{
    Error, Organization, OrganizationChangeSet, OrganizationDraft, OrganizationFilter,
    OrganizationId, OrganizationRecord, OrganizationValidationError, Principal, ReferenceTable,
};

/// Display labels resolved from the reference tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationLabels {
    #[serde(rename = "type")]
    pub type_label: String,
    pub country: String,
    pub sectors: Vec<String>,
}

/// Organization record decorated for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationDetail {
    #[serde(flatten)]
    pub record: OrganizationRecord,
    pub labels: OrganizationLabels,
}

pub(crate) fn map_organization_error(error: OrganizationPersistenceError) -> Error {
    warn!(%error, "organization repository failure");
    match error {
        OrganizationPersistenceError::Connection { message } => {
            Error::unavailable(format!("organization repository unavailable: {message}"))
        }
        OrganizationPersistenceError::Query { message } => {
            Error::internal(format!("organization repository error: {message}"))
        }
    }
}

fn map_validation_error(error: &OrganizationValidationError) -> Error {
    Error::invalid_argument(error.to_string()).with_details(json!({ "code": error.code() }))
}

/// Domain service implementing [`OrganizationDirectory`].
#[derive(Clone)]
pub struct OrganizationService<O> {
    organizations: Arc<O>,
    reference: Arc<ReferenceCache>,
    home_country: String,
    clock: Arc<dyn Clock>,
    live: LiveList<Organization>,
}

impl<O> OrganizationService<O> {
    /// Create the service; `home_country` decides the domestic area.
    pub fn new(
        organizations: Arc<O>,
        reference: Arc<ReferenceCache>,
        home_country: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            organizations,
            reference,
            home_country: home_country.into(),
            clock,
            live: LiveList::default(),
        }
    }

    fn scope_for(viewer: &Principal) -> Result<OrganizationScope, Error> {
        viewer.require_member()?;
        Ok(if viewer.is_admin() {
            OrganizationScope::All
        } else {
            OrganizationScope::ApprovedOnly
        })
    }

    fn labels(&self, organization: &Organization) -> OrganizationLabels {
        let other_sector = organization.other_sector.as_deref();
        OrganizationLabels {
            type_label: self.reference.label_with_other(
                ReferenceTable::Types,
                organization.type_code.as_deref(),
                organization.other_type.as_deref(),
            ),
            country: self
                .reference
                .optional_label(ReferenceTable::Countries, organization.country.as_deref()),
            sectors: organization
                .sectors
                .iter()
                .map(|code| {
                    self.reference
                        .label_with_other(ReferenceTable::Sectors, Some(code), other_sector)
                })
                .collect(),
        }
    }

    fn publish(&self, organization: &Organization) {
        self.live.upsert(organization.clone());
        self.reference
            .note_organization(&organization.id, &organization.name, organization.approved);
    }
}

impl<O> OrganizationService<O>
where
    O: OrganizationRepository,
{
    async fn find_existing(&self, id: &OrganizationId) -> Result<OrganizationRecord, Error> {
        self.organizations
            .find(id)
            .await
            .map_err(map_organization_error)?
            .ok_or_else(|| Error::not_found(format!("organization {id} not found")))
    }

    async fn save(&self, changes: &OrganizationChangeSet) -> Result<Organization, Error> {
        self.organizations
            .save(changes)
            .await
            .map_err(map_organization_error)
    }
}

#[async_trait]
impl<O> OrganizationDirectory for OrganizationService<O>
where
    O: OrganizationRepository,
{
    async fn list(&self, viewer: &Principal) -> Result<Vec<Organization>, Error> {
        let scope = Self::scope_for(viewer)?;
        let organizations = self
            .organizations
            .list(scope)
            .await
            .map_err(map_organization_error)?;
        if scope == OrganizationScope::All {
            self.live.replace(organizations.clone());
        }
        Ok(organizations)
    }

    async fn watch(&self, viewer: &Principal) -> Result<LiveFeed<Organization>, Error> {
        let scope = Self::scope_for(viewer)?;
        let feed = match scope {
            OrganizationScope::All => self.live.unfiltered_feed(),
            OrganizationScope::ApprovedOnly => self
                .live
                .feed(|organization: &Organization| {
                    organization.approved.then(|| organization.clone())
                }),
        };
        let organizations = self
            .organizations
            .list(OrganizationScope::All)
            .await
            .map_err(map_organization_error)?;
        self.live.replace(organizations);
        Ok(feed)
    }

    async fn filter(
        &self,
        viewer: &Principal,
        filter: &OrganizationFilter,
    ) -> Result<Vec<Organization>, Error> {
        let organizations = self.list(viewer).await?;
        Ok(organizations
            .into_iter()
            .filter(|organization| filter.matches(organization, &self.home_country))
            .collect())
    }

    async fn get(
        &self,
        viewer: &Principal,
        id: &OrganizationId,
    ) -> Result<OrganizationDetail, Error> {
        let scope = Self::scope_for(viewer)?;
        let record = self.find_existing(id).await?;
        if scope == OrganizationScope::ApprovedOnly && !record.organization.approved {
            return Err(Error::not_found(format!("organization {id} not found")));
        }
        self.reference.ensure_loaded().await;
        let labels = self.labels(&record.organization);
        Ok(OrganizationDetail { record, labels })
    }

    async fn create(
        &self,
        caller: &Principal,
        draft: OrganizationDraft,
    ) -> Result<OrganizationRecord, Error> {
        caller.require_admin()?;
        let changes = OrganizationChangeSet::create(draft, self.clock.utc())
            .map_err(|error| map_validation_error(&error))?;
        let stored = self.save(&changes).await?;
        let record = OrganizationRecord {
            organization: stored,
            ..changes.record
        };
        info!(id = %record.organization.id, "organization created");
        self.publish(&record.organization);
        Ok(record)
    }

    async fn update(
        &self,
        caller: &Principal,
        id: &OrganizationId,
        draft: OrganizationDraft,
    ) -> Result<OrganizationRecord, Error> {
        caller.require_admin()?;
        let existing = self.find_existing(id).await?;
        let changes = OrganizationChangeSet::update(&existing, draft)
            .map_err(|error| map_validation_error(&error))?;
        let stored = self.save(&changes).await?;
        info!(
            %id,
            removed_contacts = changes.removed_contacts.len(),
            address_removed = changes.removed_address.is_some(),
            "organization updated"
        );
        let record = OrganizationRecord {
            organization: stored,
            ..changes.record
        };
        self.publish(&record.organization);
        Ok(record)
    }

    async fn set_approval(
        &self,
        caller: &Principal,
        id: &OrganizationId,
        approved: bool,
    ) -> Result<Organization, Error> {
        caller.require_admin()?;
        let organization = self
            .organizations
            .set_approval(id, approved)
            .await
            .map_err(map_organization_error)?
            .ok_or_else(|| Error::not_found(format!("organization {id} not found")))?;
        info!(%id, approved, "organization approval changed");
        self.publish(&organization);
        Ok(organization)
    }

    async fn delete(&self, caller: &Principal, id: &OrganizationId) -> Result<(), Error> {
        caller.require_admin()?;
        if !self
            .organizations
            .delete(id)
            .await
            .map_err(map_organization_error)?
        {
            return Err(Error::not_found(format!("organization {id} not found")));
        }
        info!(%id, "organization deleted");
        self.live.remove(id);
        self.reference.forget_organization(id);
        Ok(())
    }
}

#[cfg(test)]
#[path = "organization_service_tests.rs"]
mod tests;
