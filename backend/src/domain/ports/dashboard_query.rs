//! Driving port for the admin dashboard.

use async_trait::async_trait;

use crate::domain::{AdminStatistics, Error, Principal};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardQuery: Send + Sync {
    /// Current record counts; administrators only.
    async fn statistics(&self, caller: &Principal) -> Result<AdminStatistics, Error>;
}
