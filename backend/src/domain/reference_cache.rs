//! Process-wide cache of reference tables and approved organization names.
//!
//! Every source (six reference tables plus the approved organization listing)
//! is fetched at most once per load. A source that fails stays unfetched and
//! is retried by the next [`ReferenceCache::ensure_loaded`]. Concurrent
//! callers queue behind one in-flight load instead of issuing their own
//! fetches.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};
use utoipa::ToSchema;

use crate::domain::ports::{
    OrganizationRepository, OrganizationScope, ReferenceQuery, ReferenceRepository,
};
use crate::domain::reference::{MISSING_LABEL, label_or_override};
use crate::domain::{Error, OrganizationId, Principal, ReferenceEntry, ReferenceTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Source {
    Table(ReferenceTable),
    ApprovedOrganizations,
}

impl Source {
    fn all() -> impl Iterator<Item = Self> {
        ReferenceTable::ALL
            .into_iter()
            .map(Self::Table)
            .chain(std::iter::once(Self::ApprovedOrganizations))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(table) => table.fmt(f),
            Self::ApprovedOrganizations => f.write_str("organizations"),
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    tables: HashMap<ReferenceTable, Vec<ReferenceEntry>>,
    organizations: Vec<ReferenceEntry>,
    fetched: HashSet<Source>,
}

/// Serialisable view of the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSnapshot {
    /// Whether a load was still in flight when the snapshot was taken.
    pub loading: bool,
    pub countries: Vec<ReferenceEntry>,
    pub languages: Vec<ReferenceEntry>,
    pub sectors: Vec<ReferenceEntry>,
    pub types: Vec<ReferenceEntry>,
    pub regions: Vec<ReferenceEntry>,
    pub affiliations: Vec<ReferenceEntry>,
    /// Approved organizations ordered by name; `code` holds the id.
    pub organizations: Vec<ReferenceEntry>,
}

/// Single shared reference cache.
pub struct ReferenceCache {
    tables: Arc<dyn ReferenceRepository>,
    organizations: Arc<dyn OrganizationRepository>,
    state: RwLock<CacheState>,
    load_lock: Mutex<()>,
    loading: watch::Sender<bool>,
    pending: AtomicUsize,
}

impl ReferenceCache {
    /// Create an empty cache over the given sources.
    pub fn new(
        tables: Arc<dyn ReferenceRepository>,
        organizations: Arc<dyn OrganizationRepository>,
    ) -> Self {
        let (loading, _receiver) = watch::channel(false);
        Self {
            tables,
            organizations,
            state: RwLock::new(CacheState::default()),
            load_lock: Mutex::new(()),
            loading,
            pending: AtomicUsize::new(0),
        }
    }

    /// Load every source that has not been fetched yet.
    pub async fn ensure_loaded(&self) {
        let _guard = self.load_lock.lock().await;
        self.load_missing().await;
    }

    /// Forget what was fetched and load everything again.
    ///
    /// Cached entries stay readable until their replacement arrives.
    pub async fn refresh(&self) {
        let _guard = self.load_lock.lock().await;
        self.write_state().fetched.clear();
        self.load_missing().await;
    }

    /// Whether a load is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    /// Observe the loading flag.
    #[must_use]
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.loading.subscribe()
    }

    /// Number of sources still loading.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Display name for `code`, or `"-"` when unknown.
    #[must_use]
    pub fn label(&self, table: ReferenceTable, code: &str) -> String {
        self.read_state()
            .tables
            .get(&table)
            .and_then(|entries| entries.iter().find(|entry| entry.code == code))
            .map_or_else(|| MISSING_LABEL.to_owned(), |entry| entry.name.clone())
    }

    /// Display name for an optional code.
    #[must_use]
    pub fn optional_label(&self, table: ReferenceTable, code: Option<&str>) -> String {
        code.map_or_else(|| MISSING_LABEL.to_owned(), |code| self.label(table, code))
    }

    /// Display name that yields to `other` for "other" buckets.
    #[must_use]
    pub fn label_with_other(
        &self,
        table: ReferenceTable,
        code: Option<&str>,
        other: Option<&str>,
    ) -> String {
        let label = self.optional_label(table, code);
        label_or_override(&label, other).to_owned()
    }

    /// Name of an approved organization, or `"-"`.
    #[must_use]
    pub fn organization_name(&self, id: &OrganizationId) -> String {
        let code = id.to_string();
        self.read_state()
            .organizations
            .iter()
            .find(|entry| entry.code == code)
            .map_or_else(|| MISSING_LABEL.to_owned(), |entry| entry.name.clone())
    }

    /// Track an organization write in the approved listing.
    pub fn note_organization(&self, id: &OrganizationId, name: &str, approved: bool) {
        let code = id.to_string();
        let mut state = self.write_state();
        state.organizations.retain(|entry| entry.code != code);
        if approved {
            state
                .organizations
                .push(ReferenceEntry::new(code, name.to_owned()));
            state
                .organizations
                .sort_by(|left, right| left.name.cmp(&right.name));
        }
    }

    /// Drop a deleted organization from the approved listing.
    pub fn forget_organization(&self, id: &OrganizationId) {
        let code = id.to_string();
        self.write_state()
            .organizations
            .retain(|entry| entry.code != code);
    }

    /// Copy of the cached data.
    #[must_use]
    pub fn current(&self) -> ReferenceSnapshot {
        let state = self.read_state();
        let table = |table: ReferenceTable| state.tables.get(&table).cloned().unwrap_or_default();
        ReferenceSnapshot {
            loading: self.is_loading(),
            countries: table(ReferenceTable::Countries),
            languages: table(ReferenceTable::Languages),
            sectors: table(ReferenceTable::Sectors),
            types: table(ReferenceTable::Types),
            regions: table(ReferenceTable::Regions),
            affiliations: table(ReferenceTable::Affiliations),
            organizations: state.organizations.clone(),
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    async fn load_missing(&self) {
        let missing: Vec<Source> = {
            let state = self.read_state();
            Source::all()
                .filter(|source| !state.fetched.contains(source))
                .collect()
        };
        if missing.is_empty() {
            return;
        }
        debug!(sources = missing.len(), "loading reference data");
        self.pending.store(missing.len(), Ordering::SeqCst);
        self.loading.send_replace(true);
        join_all(missing.into_iter().map(|source| self.load_source(source))).await;
    }

    async fn load_source(&self, source: Source) {
        let outcome = match source {
            Source::Table(table) => self
                .tables
                .load_table(table)
                .await
                .map_err(|error| error.to_string()),
            Source::ApprovedOrganizations => self
                .organizations
                .list(OrganizationScope::ApprovedOnly)
                .await
                .map(|organizations| {
                    organizations
                        .into_iter()
                        .map(|org| ReferenceEntry::new(org.id.to_string(), org.name))
                        .collect()
                })
                .map_err(|error| error.to_string()),
        };

        match outcome {
            Ok(entries) => {
                let mut state = self.write_state();
                match source {
                    Source::Table(table) => {
                        state.tables.insert(table, entries);
                    }
                    Source::ApprovedOrganizations => state.organizations = entries,
                }
                state.fetched.insert(source);
            }
            Err(error) => warn!(%source, %error, "reference source failed to load"),
        }

        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.loading.send_replace(false);
        }
    }
}

#[async_trait]
impl ReferenceQuery for ReferenceCache {
    async fn snapshot(&self) -> Result<ReferenceSnapshot, Error> {
        self.ensure_loaded().await;
        Ok(self.current())
    }

    async fn refresh(&self, caller: &Principal) -> Result<ReferenceSnapshot, Error> {
        caller.require_admin()?;
        Self::refresh(self).await;
        Ok(self.current())
    }
}

#[cfg(test)]
#[path = "reference_cache_tests.rs"]
mod tests;
