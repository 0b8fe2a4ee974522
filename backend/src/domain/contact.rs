//! Organization contacts.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ContactId, OrganizationId};

/// Contact as submitted in an organization form.
///
/// `id` is present when the entry edits an existing contact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactInput {
    pub id: Option<ContactId>,
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ContactInput {
    /// Materialise the contact for `organization` under `id`.
    #[must_use]
    pub fn into_contact(self, id: ContactId, organization: OrganizationId) -> Contact {
        Contact {
            id,
            organization,
            name: self.name.trim().to_owned(),
            title: self.title,
            email: self.email,
            phone: self.phone,
        }
    }
}

/// Stored contact belonging to exactly one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub organization: OrganizationId,
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}
