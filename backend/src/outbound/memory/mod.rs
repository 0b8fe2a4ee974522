//! In-process adapters for running without PostgreSQL or provider credentials.

mod identity;
mod seed;
mod store;

pub use identity::InMemoryIdentityProvider;
pub use store::MemoryStore;
