//! Port abstraction for user persistence adapters and their errors.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{EmailAddress, Role, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// Another user already holds the email address.
        DuplicateEmail { email: String } => "email {email} belongs to another user",
    }
}

/// Storage for provisioned user documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch the user holding `email`, if any.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Every user, ordered by name.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Atomically bump the access counter and stamp `at` as the last access.
    ///
    /// Returns `None` without writing when the user does not exist.
    async fn record_access(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Change the email and role of an existing user.
    async fn update_profile(
        &self,
        id: &UserId,
        email: &EmailAddress,
        role: Role,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Delete a user, reporting whether a row was removed.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;

    /// Number of users holding `role`.
    async fn count_by_role(&self, role: Role) -> Result<u64, UserPersistenceError>;
}
