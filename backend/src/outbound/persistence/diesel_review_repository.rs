//! PostgreSQL-backed review storage.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ReviewPersistenceError, ReviewRepository};
use crate::domain::{
    Address, OrganizationId, Review, ReviewChangeSet, ReviewId, ReviewRecord,
};

use super::diesel_basic_error_mapping::{
    count_to_u64, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{AddressRow, ReviewRow};
use super::pool::{DbPool, PoolError};
use super::schema::{addresses, reviews};

/// Diesel-backed implementation of the review repository port.
#[derive(Clone)]
pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    /// Create a new repository with the given connection pool.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReviewPersistenceError {
    map_basic_pool_error(error, ReviewPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ReviewPersistenceError {
    map_basic_diesel_error(
        error,
        ReviewPersistenceError::query,
        ReviewPersistenceError::connection,
    )
}

fn to_domain(row: ReviewRow) -> Result<Review, ReviewPersistenceError> {
    row.into_domain().map_err(ReviewPersistenceError::query)
}

#[async_trait]
impl ReviewRepository for DieselReviewRepository {
    async fn list_for_organization(
        &self,
        organization: &OrganizationId,
    ) -> Result<Vec<Review>, ReviewPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ReviewRow> = reviews::table
            .filter(reviews::organization_id.eq(*organization.as_uuid()))
            .order((reviews::created_at.desc(), reviews::id.asc()))
            .select(ReviewRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(to_domain).collect()
    }

    async fn find(&self, id: &ReviewId) -> Result<Option<ReviewRecord>, ReviewPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let Some(row) = reviews::table
            .find(*id.as_uuid())
            .select(ReviewRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };

        let address = match row.address_id {
            Some(address_id) => addresses::table
                .find(address_id)
                .select(AddressRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?
                .map(Address::from),
            None => None,
        };

        Ok(Some(ReviewRecord {
            review: to_domain(row)?,
            address,
        }))
    }

    async fn save(&self, changes: &ReviewChangeSet) -> Result<(), ReviewPersistenceError> {
        let review_row =
            ReviewRow::from_domain(&changes.record.review).map_err(ReviewPersistenceError::query)?;
        let address_row = changes.record.address.as_ref().map(AddressRow::from);
        let removed_address = changes.removed_address.map(|id| *id.as_uuid());

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                if let Some(address) = &address_row {
                    diesel::insert_into(addresses::table)
                        .values(address)
                        .on_conflict(addresses::id)
                        .do_update()
                        .set(address)
                        .execute(conn)
                        .await?;
                }

                diesel::insert_into(reviews::table)
                    .values(&review_row)
                    .on_conflict(reviews::id)
                    .do_update()
                    .set(&review_row)
                    .execute(conn)
                    .await?;

                if let Some(address_id) = removed_address {
                    diesel::delete(addresses::table.find(address_id))
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn delete(&self, id: &ReviewId) -> Result<bool, ReviewPersistenceError> {
        let id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let address_id: Option<Option<Uuid>> = diesel::delete(reviews::table.find(id))
                    .returning(reviews::address_id)
                    .get_result(conn)
                    .await
                    .optional()?;
                let Some(address_id) = address_id else {
                    return Ok(false);
                };
                if let Some(address_id) = address_id {
                    diesel::delete(addresses::table.find(address_id))
                        .execute(conn)
                        .await?;
                }
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn delete_for_organization(
        &self,
        organization: &OrganizationId,
    ) -> Result<u64, ReviewPersistenceError> {
        let organization = *organization.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = conn
            .transaction(|conn| {
                async move {
                    let address_ids: Vec<Option<Uuid>> = diesel::delete(
                        reviews::table.filter(reviews::organization_id.eq(organization)),
                    )
                    .returning(reviews::address_id)
                    .get_results(conn)
                    .await?;
                    let owned: Vec<Uuid> = address_ids.iter().flatten().copied().collect();
                    if !owned.is_empty() {
                        diesel::delete(addresses::table.filter(addresses::id.eq_any(&owned)))
                            .execute(conn)
                            .await?;
                    }
                    Ok(address_ids.len())
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        debug!(%organization, removed, "deleted organization reviews");
        Ok(u64::try_from(removed).unwrap_or(u64::MAX))
    }

    async fn count(&self) -> Result<u64, ReviewPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = reviews::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_to_u64(count))
    }
}
