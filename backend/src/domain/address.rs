//! Postal addresses owned by one organization or one review.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::AddressId;

/// Freeform postal fields submitted with an organization or review.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressInput {
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    /// Reference code from the `countries` table.
    pub country: Option<String>,
}

impl AddressInput {
    /// Whether every field is empty, in which case no address is stored.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        let blank = |value: &Option<String>| value.as_deref().is_none_or(|v| v.trim().is_empty());
        self.street.trim().is_empty()
            && self.city.trim().is_empty()
            && blank(&self.state)
            && blank(&self.postal_code)
            && blank(&self.country)
    }

    /// Materialise the address under `id`.
    #[must_use]
    pub fn into_address(self, id: AddressId) -> Address {
        Address {
            id,
            street: self.street,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
        }
    }
}

/// Stored address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub street: String,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Decide which address a parent record keeps after an edit.
///
/// Returns the address to store (reusing `existing` when present so the id is
/// stable) and the id to delete when the submission cleared the address.
#[must_use]
pub fn reconcile_address(
    existing: Option<AddressId>,
    submitted: Option<AddressInput>,
) -> (Option<Address>, Option<AddressId>) {
    match submitted.filter(|input| !input.is_blank()) {
        Some(input) => {
            let id = existing.unwrap_or_else(AddressId::random);
            (Some(input.into_address(id)), None)
        }
        None => (None, existing),
    }
}
