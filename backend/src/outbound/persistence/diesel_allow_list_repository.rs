//! PostgreSQL-backed invitation allow-list.
//!
//! Provisioning consumes the invitation and writes the user document in one
//! transaction, so a concurrent second provisioning for the same email sees
//! no invitation and writes nothing.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{AllowListPersistenceError, AllowListRepository, ProvisionOutcome};
use crate::domain::{AllowListEntry, EmailAddress, User};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{AllowListRow, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{allow_list, users};

/// Diesel-backed implementation of the allow-list port.
#[derive(Clone)]
pub struct DieselAllowListRepository {
    pool: DbPool,
}

impl DieselAllowListRepository {
    /// Create a new repository with the given connection pool.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> AllowListPersistenceError {
    map_basic_pool_error(error, AllowListPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> AllowListPersistenceError {
    map_basic_diesel_error(
        error,
        AllowListPersistenceError::query,
        AllowListPersistenceError::connection,
    )
}

fn to_domain(row: AllowListRow) -> Result<AllowListEntry, AllowListPersistenceError> {
    row.into_domain().map_err(AllowListPersistenceError::query)
}

#[async_trait]
impl AllowListRepository for DieselAllowListRepository {
    async fn find(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<AllowListEntry>, AllowListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        allow_list::table
            .find(email.as_ref())
            .select(AllowListRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(to_domain)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<AllowListEntry>, AllowListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AllowListRow> = allow_list::table
            .order(allow_list::email.asc())
            .select(AllowListRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(to_domain).collect()
    }

    async fn upsert(&self, entry: &AllowListEntry) -> Result<(), AllowListPersistenceError> {
        let row = AllowListRow::from_domain(entry);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(allow_list::table)
            .values(&row)
            .on_conflict(allow_list::email)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn remove(&self, email: &EmailAddress) -> Result<bool, AllowListPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(allow_list::table.find(email.as_ref()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn provision(&self, user: &User) -> Result<ProvisionOutcome, AllowListPersistenceError> {
        let row = UserRow::from_domain(user);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let provisioned = conn
            .transaction(|conn| {
                async move {
                    let consumed = diesel::delete(allow_list::table.find(row.email.as_str()))
                        .execute(conn)
                        .await?;
                    if consumed == 0 {
                        return Ok(false);
                    }

                    let replaced = diesel::delete(
                        users::table.filter(
                            users::email
                                .eq(row.email.as_str())
                                .or(users::id.eq(row.id.as_str())),
                        ),
                    )
                    .execute(conn)
                    .await?;
                    debug!(email = %row.email, replaced, "cleared users sharing the invitation");

                    diesel::insert_into(users::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    Ok(true)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        Ok(if provisioned {
            ProvisionOutcome::Provisioned(user.clone())
        } else {
            ProvisionOutcome::NoInvitation
        })
    }
}
