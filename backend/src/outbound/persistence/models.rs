//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations, plus the conversions to and
//! from the domain records.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use tracing::warn;
use uuid::Uuid;

use super::schema::{
    addresses, allow_list, contacts, organizations, reference_entries, reviews, users,
};
use crate::domain::{
    Address, AddressId, AllowListEntry, Contact, ContactId, EmailAddress, Organization,
    OrganizationId, ReferenceEntry, Review, ReviewContent, ReviewId, Reviewer, Role, User, UserId,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from and writing to the users table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub last_access_at: Option<DateTime<Utc>>,
    pub access_count: i32,
}

impl UserRow {
    pub(crate) fn from_domain(user: &User) -> Self {
        Self {
            id: user.id.as_ref().to_owned(),
            email: user.email.as_ref().to_owned(),
            name: user.name.clone(),
            role: user.role.as_str().to_owned(),
            created_at: user.created_at,
            last_access_at: user.last_access_at,
            access_count: i32::try_from(user.access_count).unwrap_or(i32::MAX),
        }
    }

    pub(crate) fn into_domain(self) -> Result<User, String> {
        Ok(User {
            id: UserId::new(self.id).map_err(|error| error.to_string())?,
            email: EmailAddress::new(&self.email).map_err(|error| error.to_string())?,
            name: self.name,
            role: Role::parse_lenient(&self.role),
            created_at: self.created_at,
            last_access_at: self.last_access_at,
            access_count: u32::try_from(self.access_count).unwrap_or_default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Allow-list
// ---------------------------------------------------------------------------

/// Row struct for the allow_list table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = allow_list)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct AllowListRow {
    pub email: String,
    pub role: String,
    pub name: Option<String>,
    pub invited_at: DateTime<Utc>,
}

impl AllowListRow {
    pub(crate) fn from_domain(entry: &AllowListEntry) -> Self {
        Self {
            email: entry.email.as_ref().to_owned(),
            role: entry.role.as_str().to_owned(),
            name: entry.name.clone(),
            invited_at: entry.invited_at,
        }
    }

    pub(crate) fn into_domain(self) -> Result<AllowListEntry, String> {
        Ok(AllowListEntry {
            email: EmailAddress::new(&self.email).map_err(|error| error.to_string())?,
            role: Role::parse_lenient(&self.role),
            name: self.name,
            invited_at: self.invited_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Row struct for the addresses table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct AddressRow {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl From<&Address> for AddressRow {
    fn from(address: &Address) -> Self {
        Self {
            id: *address.id.as_uuid(),
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
        }
    }
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::from_uuid(row.id),
            street: row.street,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            country: row.country,
        }
    }
}

// ---------------------------------------------------------------------------
// Organizations and contacts
// ---------------------------------------------------------------------------

/// Row struct for the organizations table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct OrganizationRow {
    pub id: Uuid,
    pub name: String,
    pub type_code: Option<String>,
    pub other_type: Option<String>,
    pub country: Option<String>,
    pub sectors: Vec<String>,
    pub other_sector: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub approved: bool,
    pub address_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl OrganizationRow {
    pub(crate) fn from_domain(organization: &Organization) -> Self {
        Self {
            id: *organization.id.as_uuid(),
            name: organization.name.clone(),
            type_code: organization.type_code.clone(),
            other_type: organization.other_type.clone(),
            country: organization.country.clone(),
            sectors: organization.sectors.clone(),
            other_sector: organization.other_sector.clone(),
            website: organization.website.clone(),
            description: organization.description.clone(),
            approved: organization.approved,
            address_id: organization.address.map(|id| *id.as_uuid()),
            created_at: organization.created_at,
        }
    }

    /// Convert with the contact ids already ordered by position.
    pub(crate) fn into_domain(self, contacts: Vec<ContactId>) -> Organization {
        Organization {
            id: OrganizationId::from_uuid(self.id),
            name: self.name,
            type_code: self.type_code,
            other_type: self.other_type,
            country: self.country,
            sectors: self.sectors,
            other_sector: self.other_sector,
            website: self.website,
            description: self.description,
            approved: self.approved,
            address: self.address_id.map(AddressId::from_uuid),
            contacts,
            created_at: self.created_at,
        }
    }
}

/// Columns an edit rewrites. `approved` and `created_at` are written on
/// insert only.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = organizations)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct OrganizationEdit<'a> {
    pub name: &'a str,
    pub type_code: Option<&'a str>,
    pub other_type: Option<&'a str>,
    pub country: Option<&'a str>,
    pub sectors: &'a [String],
    pub other_sector: Option<&'a str>,
    pub website: Option<&'a str>,
    pub description: Option<&'a str>,
    pub address_id: Option<Uuid>,
}

impl<'a> From<&'a OrganizationRow> for OrganizationEdit<'a> {
    fn from(row: &'a OrganizationRow) -> Self {
        Self {
            name: &row.name,
            type_code: row.type_code.as_deref(),
            other_type: row.other_type.as_deref(),
            country: row.country.as_deref(),
            sectors: &row.sectors,
            other_sector: row.other_sector.as_deref(),
            website: row.website.as_deref(),
            description: row.description.as_deref(),
            address_id: row.address_id,
        }
    }
}

/// Row struct for the contacts table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = contacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ContactRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub position: i16,
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactRow {
    pub(crate) fn from_domain(contact: &Contact, position: usize) -> Self {
        Self {
            id: *contact.id.as_uuid(),
            organization_id: *contact.organization.as_uuid(),
            position: i16::try_from(position).unwrap_or(i16::MAX),
            name: contact.name.clone(),
            title: contact.title.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone(),
        }
    }
}

impl From<ContactRow> for Contact {
    fn from(row: ContactRow) -> Self {
        Self {
            id: ContactId::from_uuid(row.id),
            organization: OrganizationId::from_uuid(row.organization_id),
            name: row.name,
            title: row.title,
            email: row.email,
            phone: row.phone,
        }
    }
}

// ---------------------------------------------------------------------------
// Reviews
// ---------------------------------------------------------------------------

/// Row struct for the reviews table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ReviewRow {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub reviewer_email: String,
    pub address_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub cost: Option<f64>,
    pub stipend: Option<f64>,
    pub duration: Option<String>,
    pub safety: Option<i16>,
    pub region: Option<String>,
    pub other_region: Option<String>,
    pub languages: Vec<String>,
    pub sectors: Vec<String>,
    pub other_sector: Option<String>,
    pub evaluation: Option<String>,
    pub typical_day: Option<String>,
    pub work_done: Option<String>,
    pub difficulties: Option<String>,
    pub responsiveness: Option<String>,
    pub other_comments: Option<String>,
    pub anonymous: bool,
}

impl ReviewRow {
    /// Build a row; stored reviews always carry their reviewer.
    pub(crate) fn from_domain(review: &Review) -> Result<Self, String> {
        let reviewer = review
            .reviewer
            .as_ref()
            .ok_or_else(|| format!("review {} has no reviewer", review.id))?;
        let content = &review.content;
        Ok(Self {
            id: *review.id.as_uuid(),
            organization_id: *review.organization.as_uuid(),
            reviewer_email: reviewer.email.as_ref().to_owned(),
            address_id: review.address.map(|id| *id.as_uuid()),
            created_at: review.created_at,
            cost: content.cost,
            stipend: content.stipend,
            duration: content.duration.clone(),
            safety: content.safety.map(i16::from),
            region: content.region.clone(),
            other_region: content.other_region.clone(),
            languages: content.languages.clone(),
            sectors: content.sectors.clone(),
            other_sector: content.other_sector.clone(),
            evaluation: content.evaluation.clone(),
            typical_day: content.typical_day.clone(),
            work_done: content.work_done.clone(),
            difficulties: content.difficulties.clone(),
            responsiveness: content.responsiveness.clone(),
            other_comments: content.other_comments.clone(),
            anonymous: content.anonymous,
        })
    }

    pub(crate) fn into_domain(self) -> Result<Review, String> {
        let safety = match self.safety {
            Some(raw) => match u8::try_from(raw) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(review = %self.id, raw, "discarding out-of-range safety rating");
                    None
                }
            },
            None => None,
        };
        Ok(Review {
            id: ReviewId::from_uuid(self.id),
            organization: OrganizationId::from_uuid(self.organization_id),
            reviewer: Some(Reviewer {
                email: EmailAddress::new(&self.reviewer_email)
                    .map_err(|error| error.to_string())?,
            }),
            address: self.address_id.map(AddressId::from_uuid),
            created_at: self.created_at,
            content: ReviewContent {
                cost: self.cost,
                stipend: self.stipend,
                duration: self.duration,
                safety,
                region: self.region,
                other_region: self.other_region,
                languages: self.languages,
                sectors: self.sectors,
                other_sector: self.other_sector,
                evaluation: self.evaluation,
                typical_day: self.typical_day,
                work_done: self.work_done,
                difficulties: self.difficulties,
                responsiveness: self.responsiveness,
                other_comments: self.other_comments,
                anonymous: self.anonymous,
            },
        })
    }
}

// ---------------------------------------------------------------------------
// Reference tables
// ---------------------------------------------------------------------------

/// Row struct for reading reference entries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reference_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReferenceRow {
    pub code: String,
    pub name: String,
}

impl From<ReferenceRow> for ReferenceEntry {
    fn from(row: ReferenceRow) -> Self {
        Self::new(row.code, row.name)
    }
}
