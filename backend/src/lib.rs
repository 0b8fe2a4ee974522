//! Organization review platform backend.
//!
//! Students of one institution sign in through an external identity
//! provider, browse an organization directory and review organizations.
//! Administrators manage invitations, users and approvals.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;
pub mod settings;

#[cfg(test)]
mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
