//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the repository ports backed by PostgreSQL via
//! `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain records. No business logic resides here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Atomic composites**: organization and review change sets, bulk review
//!   deletion and invitation provisioning each run in one transaction.
//!
//! # Example
//!
//! ```no_run
//! use orgreviews::outbound::persistence::{
//!     DbPool, DieselOrganizationRepository, PoolConfig, run_migrations,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let url = "postgres://localhost/reviews";
//! run_migrations(url).await?;
//! let pool = DbPool::new(PoolConfig::new(url)).await?;
//! let organizations = DieselOrganizationRepository::new(pool);
//! # let _ = organizations;
//! # Ok(())
//! # }
//! ```

mod diesel_allow_list_repository;
mod diesel_basic_error_mapping;
mod diesel_organization_repository;
mod diesel_reference_repository;
mod diesel_review_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_allow_list_repository::DieselAllowListRepository;
pub use diesel_organization_repository::DieselOrganizationRepository;
pub use diesel_reference_repository::DieselReferenceRepository;
pub use diesel_review_repository::DieselReviewRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
