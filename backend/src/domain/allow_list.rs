//! Allow-list (invitation) entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{EmailAddress, Role};

/// Invitation keyed by email, consumed at first successful account creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AllowListEntry {
    pub email: EmailAddress,
    pub role: Role,
    /// Seed display name provided by the inviting administrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub invited_at: DateTime<Utc>,
}

impl AllowListEntry {
    /// Seed name if the administrator provided a non-blank one.
    #[must_use]
    pub fn seed_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
