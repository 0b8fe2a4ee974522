//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers, and the services that implement the driving ports.
//! Keep types immutable and document invariants and serialisation contracts
//! (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User, Organization, Review: the stored aggregates.
//! - ClaimsSynchronizer, AccessGate, ReferenceCache: identity and lookup
//!   services.
//! - OrganizationService, ReviewService, UserAdminService, DashboardService:
//!   record services.

pub mod access_gate;
pub mod address;
pub mod allow_list;
pub mod claims;
pub mod claims_sync;
pub mod contact;
pub mod dashboard_service;
pub mod error;
pub mod ids;
pub mod institution;
pub mod live_list;
pub mod organization;
pub mod organization_filter;
pub mod organization_service;
pub mod ports;
pub mod principal;
pub mod reference;
pub mod reference_cache;
pub mod review;
pub mod review_service;
pub mod statistics;
pub mod trace_id;
pub mod user;
pub mod user_admin_service;

pub use self::access_gate::{AccessGate, GateRun, GateState};
pub use self::address::{Address, AddressInput};
pub use self::allow_list::AllowListEntry;
pub use self::claims::{CustomClaims, ProvisioningState};
pub use self::claims_sync::ClaimsSynchronizer;
pub use self::contact::{Contact, ContactInput};
pub use self::dashboard_service::DashboardService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{AddressId, ContactId, InvalidRecordId, OrganizationId, ReviewId};
pub use self::institution::{DEFAULT_INSTITUTION_DOMAIN, InstitutionDomain, InstitutionDomainError};
pub use self::live_list::{Keyed, LiveFeed, LiveList, LiveLists};
pub use self::organization::{
    MAX_ORGANIZATION_CONTACTS, Organization, OrganizationChangeSet, OrganizationDraft,
    OrganizationRecord, OrganizationValidationError,
};
pub use self::organization_filter::{Area, DEFAULT_HOME_COUNTRY, OrganizationFilter};
pub use self::organization_service::{OrganizationDetail, OrganizationLabels, OrganizationService};
pub use self::principal::Principal;
pub use self::reference::{ReferenceEntry, ReferenceTable};
pub use self::reference_cache::{ReferenceCache, ReferenceSnapshot};
pub use self::review::{
    Review, ReviewChangeSet, ReviewContent, ReviewDraft, ReviewRecord, ReviewValidationError,
    Reviewer,
};
pub use self::review_service::{ReviewDetail, ReviewLabels, ReviewService};
pub use self::statistics::AdminStatistics;
pub use self::trace_id::TraceId;
pub use self::user::{EmailAddress, Role, User, UserId, UserValidationError};
pub use self::user_admin_service::UserAdminService;

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use orgreviews::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::permission_denied("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
