//! Partner organizations and their composite (address + contacts) records.
//!
//! An organization is created unapproved and becomes visible to students once
//! an administrator approves it. Its address and contacts have no lifecycle of
//! their own; every change to the three is planned here as one
//! [`OrganizationChangeSet`] and persisted atomically by the repository.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::address::reconcile_address;
use crate::domain::{
    Address, AddressId, AddressInput, Contact, ContactId, ContactInput, OrganizationId,
};

/// Maximum number of contacts an organization may list.
pub const MAX_ORGANIZATION_CONTACTS: usize = 3;

/// Validation failures for organization submissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationValidationError {
    EmptyName,
    TooManyContacts { max: usize, actual: usize },
    EmptyContactName { index: usize },
    DuplicateContact { index: usize },
    ForeignContact { index: usize, id: ContactId },
}

impl OrganizationValidationError {
    /// Stable code for HTTP details.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptyName => "empty_name",
            Self::TooManyContacts { .. } => "too_many_contacts",
            Self::EmptyContactName { .. } => "empty_contact_name",
            Self::DuplicateContact { .. } => "duplicate_contact",
            Self::ForeignContact { .. } => "foreign_contact",
        }
    }
}

impl fmt::Display for OrganizationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "organization name must not be empty"),
            Self::TooManyContacts { max, actual } => {
                write!(f, "an organization may list at most {max} contacts, got {actual}")
            }
            Self::EmptyContactName { index } => {
                write!(f, "contact {index} must have a name")
            }
            Self::DuplicateContact { index } => {
                write!(f, "contact {index} repeats an earlier contact id")
            }
            Self::ForeignContact { index, id } => {
                write!(f, "contact {index} ({id}) does not belong to this organization")
            }
        }
    }
}

impl std::error::Error for OrganizationValidationError {}

/// Stored organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    /// Reference code from the `types` table.
    #[serde(rename = "type")]
    pub type_code: Option<String>,
    pub other_type: Option<String>,
    /// Reference code from the `countries` table.
    pub country: Option<String>,
    pub sectors: Vec<String>,
    pub other_sector: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub approved: bool,
    pub address: Option<AddressId>,
    pub contacts: Vec<ContactId>,
    pub created_at: DateTime<Utc>,
}

/// Organization form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct OrganizationDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub type_code: Option<String>,
    pub other_type: Option<String>,
    pub country: Option<String>,
    pub sectors: Vec<String>,
    pub other_sector: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub address: Option<AddressInput>,
    pub contacts: Vec<ContactInput>,
}

impl OrganizationDraft {
    /// Validate field-level constraints that do not depend on stored state.
    pub fn validate(&self) -> Result<(), OrganizationValidationError> {
        if self.name.trim().is_empty() {
            return Err(OrganizationValidationError::EmptyName);
        }
        if self.contacts.len() > MAX_ORGANIZATION_CONTACTS {
            return Err(OrganizationValidationError::TooManyContacts {
                max: MAX_ORGANIZATION_CONTACTS,
                actual: self.contacts.len(),
            });
        }
        let mut seen = HashSet::new();
        for (index, contact) in self.contacts.iter().enumerate() {
            if contact.name.trim().is_empty() {
                return Err(OrganizationValidationError::EmptyContactName { index });
            }
            if let Some(id) = contact.id
                && !seen.insert(id)
            {
                return Err(OrganizationValidationError::DuplicateContact { index });
            }
        }
        Ok(())
    }
}

/// Organization together with the records it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRecord {
    pub organization: Organization,
    pub address: Option<Address>,
    pub contacts: Vec<Contact>,
}

/// Atomic write plan for one organization composite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationChangeSet {
    pub record: OrganizationRecord,
    pub removed_address: Option<AddressId>,
    pub removed_contacts: Vec<ContactId>,
}

impl OrganizationChangeSet {
    /// Plan the creation of a new, unapproved organization.
    pub fn create(
        draft: OrganizationDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, OrganizationValidationError> {
        draft.validate()?;
        let id = OrganizationId::random();
        if let Some((index, contact_id)) = draft
            .contacts
            .iter()
            .enumerate()
            .find_map(|(index, contact)| contact.id.map(|id| (index, id)))
        {
            return Err(OrganizationValidationError::ForeignContact {
                index,
                id: contact_id,
            });
        }
        Ok(Self::assemble(id, draft, None, &[], false, now))
    }

    /// Plan an edit of `existing`, deleting contacts that were dropped from
    /// the list and the address when it was cleared.
    pub fn update(
        existing: &OrganizationRecord,
        draft: OrganizationDraft,
    ) -> Result<Self, OrganizationValidationError> {
        draft.validate()?;
        let current = &existing.organization;
        for (index, contact) in draft.contacts.iter().enumerate() {
            if let Some(id) = contact.id
                && !current.contacts.contains(&id)
            {
                return Err(OrganizationValidationError::ForeignContact { index, id });
            }
        }
        Ok(Self::assemble(
            current.id,
            draft,
            current.address,
            &current.contacts,
            current.approved,
            current.created_at,
        ))
    }

    fn assemble(
        id: OrganizationId,
        draft: OrganizationDraft,
        existing_address: Option<AddressId>,
        existing_contacts: &[ContactId],
        approved: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        let OrganizationDraft {
            name,
            type_code,
            other_type,
            country,
            sectors,
            other_sector,
            website,
            description,
            address,
            contacts,
        } = draft;

        let (address, removed_address) = reconcile_address(existing_address, address);
        let contacts: Vec<Contact> = contacts
            .into_iter()
            .map(|input| {
                let contact_id = input.id.unwrap_or_else(ContactId::random);
                input.into_contact(contact_id, id)
            })
            .collect();
        let removed_contacts = existing_contacts
            .iter()
            .filter(|existing| !contacts.iter().any(|contact| contact.id == **existing))
            .copied()
            .collect();

        let organization = Organization {
            id,
            name: name.trim().to_owned(),
            type_code,
            other_type,
            country,
            sectors,
            other_sector,
            website,
            description,
            approved,
            address: address.as_ref().map(|address| address.id),
            contacts: contacts.iter().map(|contact| contact.id).collect(),
            created_at,
        };

        Self {
            record: OrganizationRecord {
                organization,
                address,
                contacts,
            },
            removed_address,
            removed_contacts,
        }
    }
}
