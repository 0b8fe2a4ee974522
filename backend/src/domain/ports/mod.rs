//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, the identity provider) are implemented by
//! outbound adapters. Driving ports are implemented by domain services and
//! called by the inbound HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod allow_list_repository;
mod claims_command;
mod dashboard_query;
mod identity_hooks;
mod identity_provider;
mod organization_directory;
mod organization_repository;
mod reference_query;
mod reference_repository;
mod review_board;
mod review_repository;
mod session_gate;
mod user_administration;
mod user_repository;

#[cfg(test)]
pub use allow_list_repository::MockAllowListRepository;
pub use allow_list_repository::{
    AllowListPersistenceError, AllowListRepository, ProvisionOutcome,
};
pub use claims_command::ClaimsCommand;
#[cfg(test)]
pub use claims_command::MockClaimsCommand;
pub use dashboard_query::DashboardQuery;
#[cfg(test)]
pub use dashboard_query::MockDashboardQuery;
#[cfg(test)]
pub use identity_hooks::MockIdentityHooks;
pub use identity_hooks::{AccountCreationEvent, IdentityHooks, SignInEvent};
#[cfg(test)]
pub use identity_provider::MockIdentityProvider;
pub use identity_provider::{IdToken, IdentityProvider, IdentityProviderError, VerifiedIdentity};
#[cfg(test)]
pub use organization_directory::MockOrganizationDirectory;
pub use organization_directory::OrganizationDirectory;
#[cfg(test)]
pub use organization_repository::MockOrganizationRepository;
pub use organization_repository::{
    OrganizationPersistenceError, OrganizationRepository, OrganizationScope,
};
#[cfg(test)]
pub use reference_query::MockReferenceQuery;
pub use reference_query::ReferenceQuery;
#[cfg(test)]
pub use reference_repository::MockReferenceRepository;
pub use reference_repository::{ReferencePersistenceError, ReferenceRepository};
#[cfg(test)]
pub use review_board::MockReviewBoard;
pub use review_board::ReviewBoard;
#[cfg(test)]
pub use review_repository::MockReviewRepository;
pub use review_repository::{ReviewPersistenceError, ReviewRepository};
#[cfg(test)]
pub use session_gate::MockSessionGate;
pub use session_gate::SessionGate;
#[cfg(test)]
pub use user_administration::MockUserAdministration;
pub use user_administration::{InvitationRequest, UserAdministration, UserUpdate};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
