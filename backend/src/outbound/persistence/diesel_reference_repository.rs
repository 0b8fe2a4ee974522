//! PostgreSQL-backed reference tables.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{ReferencePersistenceError, ReferenceRepository};
use crate::domain::{ReferenceEntry, ReferenceTable};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::ReferenceRow;
use super::pool::DbPool;
use super::schema::reference_entries;

/// Reads every reference table from the shared `reference_entries` table.
#[derive(Clone)]
pub struct DieselReferenceRepository {
    pool: DbPool,
}

impl DieselReferenceRepository {
    /// Create a new repository with the given connection pool.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceRepository for DieselReferenceRepository {
    async fn load_table(
        &self,
        table: ReferenceTable,
    ) -> Result<Vec<ReferenceEntry>, ReferencePersistenceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|error| map_basic_pool_error(error, ReferencePersistenceError::connection))?;
        let rows: Vec<ReferenceRow> = reference_entries::table
            .filter(reference_entries::table_name.eq(table.as_str()))
            .order((reference_entries::name.asc(), reference_entries::code.asc()))
            .select(ReferenceRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|error| {
                map_basic_diesel_error(
                    error,
                    ReferencePersistenceError::query,
                    ReferencePersistenceError::connection,
                )
            })?;
        Ok(rows.into_iter().map(ReferenceEntry::from).collect())
    }
}
