//! Port for the read-only reference tables.

use async_trait::async_trait;

use crate::domain::{ReferenceEntry, ReferenceTable};

use super::define_port_error;

define_port_error! {
    /// Errors raised while loading reference data.
    pub enum ReferencePersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "reference repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } => "reference repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReferenceRepository: Send + Sync {
    /// Every entry of `table`, ordered by name.
    async fn load_table(
        &self,
        table: ReferenceTable,
    ) -> Result<Vec<ReferenceEntry>, ReferencePersistenceError>;
}
