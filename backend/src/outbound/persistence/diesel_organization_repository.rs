//! PostgreSQL-backed organization composites.
//!
//! An organization row owns at most one address row and an ordered list of
//! contact rows. Change sets are applied inside one transaction so readers
//! never observe a partially written composite.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    OrganizationPersistenceError, OrganizationRepository, OrganizationScope,
};
use crate::domain::{
    Address, Contact, ContactId, Organization, OrganizationChangeSet, OrganizationId,
    OrganizationRecord,
};

use super::diesel_basic_error_mapping::{
    count_to_u64, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{AddressRow, ContactRow, OrganizationEdit, OrganizationRow};
use super::pool::{DbPool, PoolError};
use super::schema::{addresses, contacts, organizations};

/// Diesel-backed implementation of the organization repository port.
#[derive(Clone)]
pub struct DieselOrganizationRepository {
    pool: DbPool,
}

impl DieselOrganizationRepository {
    /// Create a new repository with the given connection pool.
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrganizationPersistenceError {
    map_basic_pool_error(error, OrganizationPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OrganizationPersistenceError {
    map_basic_diesel_error(
        error,
        OrganizationPersistenceError::query,
        OrganizationPersistenceError::connection,
    )
}

/// Contact ids of each organization in `ids`, in position order.
async fn contact_ids_by_organization(
    conn: &mut AsyncPgConnection,
    ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<ContactId>>, diesel::result::Error> {
    let pairs: Vec<(Uuid, Uuid)> = contacts::table
        .filter(contacts::organization_id.eq_any(ids))
        .order((contacts::organization_id.asc(), contacts::position.asc()))
        .select((contacts::organization_id, contacts::id))
        .load(conn)
        .await?;
    let mut grouped: HashMap<Uuid, Vec<ContactId>> = HashMap::new();
    for (organization, contact) in pairs {
        grouped
            .entry(organization)
            .or_default()
            .push(ContactId::from_uuid(contact));
    }
    Ok(grouped)
}

async fn attach_contacts(
    conn: &mut AsyncPgConnection,
    rows: Vec<OrganizationRow>,
) -> Result<Vec<Organization>, diesel::result::Error> {
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let mut grouped = contact_ids_by_organization(conn, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let contacts = grouped.remove(&row.id).unwrap_or_default();
            row.into_domain(contacts)
        })
        .collect())
}

#[async_trait]
impl OrganizationRepository for DieselOrganizationRepository {
    async fn list(
        &self,
        scope: OrganizationScope,
    ) -> Result<Vec<Organization>, OrganizationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = organizations::table.into_boxed();
        if scope == OrganizationScope::ApprovedOnly {
            query = query.filter(organizations::approved.eq(true));
        }
        let rows: Vec<OrganizationRow> = query
            .order((organizations::name.asc(), organizations::id.asc()))
            .select(OrganizationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        attach_contacts(&mut conn, rows)
            .await
            .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationRecord>, OrganizationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let Some(row) = organizations::table
            .find(*id.as_uuid())
            .select(OrganizationRow::as_select())
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

        let contact_rows: Vec<ContactRow> = contacts::table
            .filter(contacts::organization_id.eq(row.id))
            .order(contacts::position.asc())
            .select(ContactRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let contacts: Vec<Contact> = contact_rows.into_iter().map(Contact::from).collect();
        let contact_ids = contacts.iter().map(|contact| contact.id).collect();

        Ok(Some(OrganizationRecord {
            organization: row.into_domain(contact_ids),
            address,
            contacts,
        }))
    }

    async fn save(
        &self,
        changes: &OrganizationChangeSet,
    ) -> Result<Organization, OrganizationPersistenceError> {
        let record = &changes.record;
        let organization_row = OrganizationRow::from_domain(&record.organization);
        let address_row = record.address.as_ref().map(AddressRow::from);
        let contact_rows: Vec<ContactRow> = record
            .contacts
            .iter()
            .enumerate()
            .map(|(position, contact)| ContactRow::from_domain(contact, position))
            .collect();
        let removed_contacts: Vec<Uuid> = changes
            .removed_contacts
            .iter()
            .map(|id| *id.as_uuid())
            .collect();
        let contact_ids = record.organization.contacts.clone();
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

                let stored: OrganizationRow = diesel::insert_into(organizations::table)
                    .values(&organization_row)
                    .on_conflict(organizations::id)
                    .do_update()
                    .set(OrganizationEdit::from(&organization_row))
                    .returning(OrganizationRow::as_returning())
                    .get_result(conn)
                    .await?;

                if !removed_contacts.is_empty() {
                    diesel::delete(contacts::table.filter(contacts::id.eq_any(&removed_contacts)))
                        .execute(conn)
                        .await?;
                }

                for contact in &contact_rows {
                    diesel::insert_into(contacts::table)
                        .values(contact)
                        .on_conflict(contacts::id)
                        .do_update()
                        .set(contact)
                        .execute(conn)
                        .await?;
                }

                if let Some(address_id) = removed_address {
                    diesel::delete(addresses::table.find(address_id))
                        .execute(conn)
                        .await?;
                }
                Ok(stored.into_domain(contact_ids))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn set_approval(
        &self,
        id: &OrganizationId,
        approved: bool,
    ) -> Result<Option<Organization>, OrganizationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let Some(row) = diesel::update(organizations::table.find(*id.as_uuid()))
            .set(organizations::approved.eq(approved))
            .returning(OrganizationRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
        else {
            return Ok(None);
        };
        let mut updated = attach_contacts(&mut conn, vec![row])
            .await
            .map_err(map_diesel_error)?;
        Ok(updated.pop())
    }

    async fn delete(&self, id: &OrganizationId) -> Result<bool, OrganizationPersistenceError> {
        let id = *id.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let address_id: Option<Option<Uuid>> = organizations::table
                    .find(id)
                    .select(organizations::address_id)
                    .first(conn)
                    .await
                    .optional()?;
                let Some(address_id) = address_id else {
                    return Ok(false);
                };

                diesel::delete(contacts::table.filter(contacts::organization_id.eq(id)))
                    .execute(conn)
                    .await?;
                diesel::delete(organizations::table.find(id))
                    .execute(conn)
                    .await?;
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

    async fn count(&self, approved: bool) -> Result<u64, OrganizationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = organizations::table
            .filter(organizations::approved.eq(approved))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(count_to_u64(count))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for organization repository error mapping.
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_map_to_connection_errors() {
        let error = map_pool_error(PoolError::checkout("timed out"));
        assert!(matches!(
            error,
            OrganizationPersistenceError::Connection { .. }
        ));
        assert!(error.to_string().contains("timed out"));
    }

    #[rstest]
    fn query_builder_failures_map_to_query_errors() {
        let error = map_diesel_error(diesel::result::Error::NotFound);
        assert!(matches!(error, OrganizationPersistenceError::Query { .. }));
    }
}
