//! Process-local record store implementing every repository port.
//!
//! All collections sit behind one `tokio::sync::RwLock`; a composite write
//! holds the write lock for the whole change set, so readers never observe a
//! half-applied organization or review.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{
    AllowListPersistenceError, AllowListRepository, OrganizationPersistenceError,
    OrganizationRepository, OrganizationScope, ProvisionOutcome, ReferencePersistenceError,
    ReferenceRepository, ReviewPersistenceError, ReviewRepository, UserPersistenceError,
    UserRepository,
};
use crate::domain::{
    Address, AddressId, AllowListEntry, Contact, ContactId, EmailAddress, Organization,
    OrganizationChangeSet, OrganizationId, OrganizationRecord, ReferenceEntry, ReferenceTable,
    Review, ReviewChangeSet, ReviewId, ReviewRecord, Role, User, UserId,
};

use super::seed;

#[derive(Debug, Default)]
struct StoreState {
    users: BTreeMap<UserId, User>,
    allow_list: BTreeMap<EmailAddress, AllowListEntry>,
    organizations: BTreeMap<OrganizationId, Organization>,
    addresses: BTreeMap<AddressId, Address>,
    contacts: BTreeMap<ContactId, Contact>,
    reviews: BTreeMap<ReviewId, Review>,
    reference: HashMap<ReferenceTable, Vec<ReferenceEntry>>,
}

impl StoreState {
    fn organization_record(&self, organization: &Organization) -> OrganizationRecord {
        OrganizationRecord {
            organization: organization.clone(),
            address: organization
                .address
                .and_then(|id| self.addresses.get(&id).cloned()),
            contacts: organization
                .contacts
                .iter()
                .filter_map(|id| self.contacts.get(id).cloned())
                .collect(),
        }
    }

    fn drop_review(&mut self, id: &ReviewId) -> bool {
        match self.reviews.remove(id) {
            Some(review) => {
                if let Some(address) = review.address {
                    self.addresses.remove(&address);
                }
                true
            }
            None => false,
        }
    }
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// In-memory implementation of the repository ports.
///
/// Used when no database is configured and by the integration tests.
#[derive(Debug)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a store holding the built-in reference rows and no records.
    #[must_use]
    pub fn new() -> Self {
        let reference = ReferenceTable::ALL
            .into_iter()
            .map(|table| (table, seed::entries(table)))
            .collect();
        Self {
            state: RwLock::new(StoreState {
                reference,
                ..StoreState::default()
            }),
        }
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.state.read().await.users.get(id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|user| user.email == *email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let mut users: Vec<User> = self.state.read().await.users.values().cloned().collect();
        users.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(users)
    }

    async fn record_access(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut state = self.state.write().await;
        Ok(state.users.get_mut(id).map(|user| {
            user.record_access(at);
            user.clone()
        }))
    }

    async fn update_profile(
        &self,
        id: &UserId,
        email: &EmailAddress,
        role: Role,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut state = self.state.write().await;
        if state
            .users
            .values()
            .any(|user| user.email == *email && user.id != *id)
        {
            return Err(UserPersistenceError::duplicate_email(email.as_ref()));
        }
        Ok(state.users.get_mut(id).map(|user| {
            user.email = email.clone();
            user.role = role;
            user.clone()
        }))
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        Ok(self.state.write().await.users.remove(id).is_some())
    }

    async fn count_by_role(&self, role: Role) -> Result<u64, UserPersistenceError> {
        let state = self.state.read().await;
        Ok(count(
            state.users.values().filter(|user| user.role == role).count(),
        ))
    }
}

#[async_trait]
impl AllowListRepository for MemoryStore {
    async fn find(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<AllowListEntry>, AllowListPersistenceError> {
        Ok(self.state.read().await.allow_list.get(email).cloned())
    }

    async fn list(&self) -> Result<Vec<AllowListEntry>, AllowListPersistenceError> {
        Ok(self
            .state
            .read()
            .await
            .allow_list
            .values()
            .cloned()
            .collect())
    }

    async fn upsert(&self, entry: &AllowListEntry) -> Result<(), AllowListPersistenceError> {
        self.state
            .write()
            .await
            .allow_list
            .insert(entry.email.clone(), entry.clone());
        Ok(())
    }

    async fn remove(&self, email: &EmailAddress) -> Result<bool, AllowListPersistenceError> {
        Ok(self.state.write().await.allow_list.remove(email).is_some())
    }

    async fn provision(&self, user: &User) -> Result<ProvisionOutcome, AllowListPersistenceError> {
        let mut state = self.state.write().await;
        if state.allow_list.remove(&user.email).is_none() {
            return Ok(ProvisionOutcome::NoInvitation);
        }
        state
            .users
            .retain(|id, existing| existing.email != user.email || *id == user.id);
        state.users.insert(user.id.clone(), user.clone());
        Ok(ProvisionOutcome::Provisioned(user.clone()))
    }
}

#[async_trait]
impl OrganizationRepository for MemoryStore {
    async fn list(
        &self,
        scope: OrganizationScope,
    ) -> Result<Vec<Organization>, OrganizationPersistenceError> {
        let state = self.state.read().await;
        let mut organizations: Vec<Organization> = state
            .organizations
            .values()
            .filter(|organization| scope == OrganizationScope::All || organization.approved)
            .cloned()
            .collect();
        organizations.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(organizations)
    }

    async fn find(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationRecord>, OrganizationPersistenceError> {
        let state = self.state.read().await;
        Ok(state
            .organizations
            .get(id)
            .map(|organization| state.organization_record(organization)))
    }

    async fn save(
        &self,
        changes: &OrganizationChangeSet,
    ) -> Result<Organization, OrganizationPersistenceError> {
        let mut state = self.state.write().await;
        let record = &changes.record;
        let mut organization = record.organization.clone();
        if let Some(stored) = state.organizations.get(&organization.id) {
            organization.approved = stored.approved;
            organization.created_at = stored.created_at;
        }
        if let Some(address) = changes.removed_address {
            state.addresses.remove(&address);
        }
        for contact in &changes.removed_contacts {
            state.contacts.remove(contact);
        }
        if let Some(address) = &record.address {
            state.addresses.insert(address.id, address.clone());
        }
        for contact in &record.contacts {
            state.contacts.insert(contact.id, contact.clone());
        }
        state
            .organizations
            .insert(organization.id, organization.clone());
        Ok(organization)
    }

    async fn set_approval(
        &self,
        id: &OrganizationId,
        approved: bool,
    ) -> Result<Option<Organization>, OrganizationPersistenceError> {
        let mut state = self.state.write().await;
        Ok(state.organizations.get_mut(id).map(|organization| {
            organization.approved = approved;
            organization.clone()
        }))
    }

    async fn delete(&self, id: &OrganizationId) -> Result<bool, OrganizationPersistenceError> {
        let mut state = self.state.write().await;
        let Some(organization) = state.organizations.remove(id) else {
            return Ok(false);
        };
        if let Some(address) = organization.address {
            state.addresses.remove(&address);
        }
        state.contacts.retain(|_, contact| contact.organization != *id);
        Ok(true)
    }

    async fn count(&self, approved: bool) -> Result<u64, OrganizationPersistenceError> {
        let state = self.state.read().await;
        Ok(count(
            state
                .organizations
                .values()
                .filter(|organization| organization.approved == approved)
                .count(),
        ))
    }
}

#[async_trait]
impl ReviewRepository for MemoryStore {
    async fn list_for_organization(
        &self,
        organization: &OrganizationId,
    ) -> Result<Vec<Review>, ReviewPersistenceError> {
        let state = self.state.read().await;
        let mut reviews: Vec<Review> = state
            .reviews
            .values()
            .filter(|review| review.organization == *organization)
            .cloned()
            .collect();
        reviews.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(reviews)
    }

    async fn find(&self, id: &ReviewId) -> Result<Option<ReviewRecord>, ReviewPersistenceError> {
        let state = self.state.read().await;
        Ok(state.reviews.get(id).map(|review| ReviewRecord {
            review: review.clone(),
            address: review
                .address
                .and_then(|address| state.addresses.get(&address).cloned()),
        }))
    }

    async fn save(&self, changes: &ReviewChangeSet) -> Result<(), ReviewPersistenceError> {
        let mut state = self.state.write().await;
        if let Some(address) = changes.removed_address {
            state.addresses.remove(&address);
        }
        if let Some(address) = &changes.record.address {
            state.addresses.insert(address.id, address.clone());
        }
        let review = &changes.record.review;
        state.reviews.insert(review.id, review.clone());
        Ok(())
    }

    async fn delete(&self, id: &ReviewId) -> Result<bool, ReviewPersistenceError> {
        Ok(self.state.write().await.drop_review(id))
    }

    async fn delete_for_organization(
        &self,
        organization: &OrganizationId,
    ) -> Result<u64, ReviewPersistenceError> {
        let mut state = self.state.write().await;
        let doomed: Vec<ReviewId> = state
            .reviews
            .values()
            .filter(|review| review.organization == *organization)
            .map(|review| review.id)
            .collect();
        for id in &doomed {
            state.drop_review(id);
        }
        Ok(count(doomed.len()))
    }

    async fn count(&self) -> Result<u64, ReviewPersistenceError> {
        Ok(count(self.state.read().await.reviews.len()))
    }
}

#[async_trait]
impl ReferenceRepository for MemoryStore {
    async fn load_table(
        &self,
        table: ReferenceTable,
    ) -> Result<Vec<ReferenceEntry>, ReferencePersistenceError> {
        let mut entries = self
            .state
            .read()
            .await
            .reference
            .get(&table)
            .cloned()
            .unwrap_or_default();
        entries.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(entries)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
