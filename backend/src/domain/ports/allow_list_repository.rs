//! Port for the invitation allow-list.
//!
//! Entries are consumed by [`AllowListRepository::provision`], which turns an
//! invitation into a user document in a single transaction.

use async_trait::async_trait;

use crate::domain::{AllowListEntry, EmailAddress, User};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by allow-list adapters.
    pub enum AllowListPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "allow-list connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "allow-list query failed: {message}",
    }
}

/// Result of consuming an invitation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// The entry was consumed and the user written.
    Provisioned(User),
    /// No entry existed for the email when the transaction ran.
    NoInvitation,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AllowListRepository: Send + Sync {
    /// Fetch the invitation for `email`.
    async fn find(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<AllowListEntry>, AllowListPersistenceError>;

    /// Every pending invitation, ordered by email.
    async fn list(&self) -> Result<Vec<AllowListEntry>, AllowListPersistenceError>;

    /// Insert or replace the invitation keyed by its email.
    async fn upsert(&self, entry: &AllowListEntry) -> Result<(), AllowListPersistenceError>;

    /// Remove the invitation for `email`, reporting whether one existed.
    async fn remove(&self, email: &EmailAddress) -> Result<bool, AllowListPersistenceError>;

    /// Consume the invitation for `user.email` and store `user`.
    ///
    /// In one transaction: delete users sharing the email under another id,
    /// delete the invitation and insert the user. When the invitation is gone
    /// nothing is written and [`ProvisionOutcome::NoInvitation`] is returned.
    async fn provision(&self, user: &User) -> Result<ProvisionOutcome, AllowListPersistenceError>;
}
