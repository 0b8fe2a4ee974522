//! Dashboard counters for administrators.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Record counts shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatistics {
    pub approved_organizations: u64,
    pub pending_organizations: u64,
    pub reviews: u64,
    pub students: u64,
    pub admins: u64,
}
