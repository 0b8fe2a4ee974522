//! Driving port for reference data reads.

use async_trait::async_trait;

use crate::domain::{Error, Principal, ReferenceSnapshot};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceQuery: Send + Sync {
    /// Current reference data, loading sources not fetched yet.
    async fn snapshot(&self) -> Result<ReferenceSnapshot, Error>;

    /// Drop every cached table and reload; administrators only.
    async fn refresh(&self, caller: &Principal) -> Result<ReferenceSnapshot, Error>;
}
