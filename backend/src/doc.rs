//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every inbound HTTP handler and the domain types they
//! exchange, plus the session cookie and hook bearer security schemes. The
//! document backs Swagger UI in debug builds and `openapi-dump`.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{AccountCreationEvent, InvitationRequest, SignInEvent, UserUpdate};
use crate::domain::{
    Address, AddressInput, AdminStatistics, AllowListEntry, Area, Contact, ContactInput,
    CustomClaims, Error, ErrorCode, GateState, Organization, OrganizationDetail,
    OrganizationDraft, OrganizationLabels, OrganizationRecord, ReferenceEntry, ReferenceSnapshot,
    Review, ReviewContent, ReviewDetail, ReviewDraft, ReviewLabels, ReviewRecord, Reviewer, Role,
    User,
};
use crate::inbound::http::auth::{SessionView, SignInRequest, SignInResponse};
use crate::inbound::http::claims::{SetClaimsRequest, SetClaimsResponse};
use crate::inbound::http::health::ProbeStatus;
use crate::inbound::http::organizations::ApprovalRequest;
use crate::inbound::http::reviews::DeletedReviews;

/// Enrich the generated document with the security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/session.",
            ))),
        );
        components.add_security_scheme(
            "HookSecret",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Organization reviews API",
        description = "Invitation-only directory of organizations reviewed by students."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::identity_hooks::before_create,
        crate::inbound::http::identity_hooks::before_sign_in,
        crate::inbound::http::auth::sign_in,
        crate::inbound::http::auth::current_session,
        crate::inbound::http::auth::sign_out,
        crate::inbound::http::claims::set_claims,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::users::provisioning,
        crate::inbound::http::invitations::list_invitations,
        crate::inbound::http::invitations::create_invitation,
        crate::inbound::http::invitations::revoke_invitation,
        crate::inbound::http::dashboard::statistics,
        crate::inbound::http::organizations::list_organizations,
        crate::inbound::http::organizations::create_organization,
        crate::inbound::http::organizations::get_organization,
        crate::inbound::http::organizations::update_organization,
        crate::inbound::http::organizations::set_approval,
        crate::inbound::http::organizations::delete_organization,
        crate::inbound::http::reviews::list_reviews,
        crate::inbound::http::reviews::create_review,
        crate::inbound::http::reviews::delete_organization_reviews,
        crate::inbound::http::reviews::get_review,
        crate::inbound::http::reviews::update_review,
        crate::inbound::http::reviews::delete_review,
        crate::inbound::http::reference::snapshot,
        crate::inbound::http::reference::refresh,
        crate::inbound::http::live::watch_organizations,
        crate::inbound::http::live::watch_reviews,
        crate::inbound::http::live::watch_users,
        crate::inbound::http::live::watch_invitations,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error, ErrorCode, User, Role, AllowListEntry, CustomClaims, GateState, AdminStatistics,
        Organization, OrganizationDraft, OrganizationRecord, OrganizationDetail,
        OrganizationLabels, Address, AddressInput, Contact, ContactInput, Area, Review,
        ReviewContent, ReviewDraft, ReviewRecord, ReviewDetail, ReviewLabels, Reviewer,
        ReferenceEntry, ReferenceSnapshot,
        AccountCreationEvent, SignInEvent, InvitationRequest, UserUpdate, SessionView,
        SignInRequest, SignInResponse, SetClaimsRequest, SetClaimsResponse, ApprovalRequest,
        DeletedReviews, ProbeStatus
    )),
    tags(
        (name = "identity", description = "Blocking hooks called by the identity provider"),
        (name = "session", description = "Sign-in through the access gate"),
        (name = "claims", description = "Custom claims synchronisation"),
        (name = "users", description = "User administration"),
        (name = "invitations", description = "Allow-list administration"),
        (name = "dashboard", description = "Admin dashboard counters"),
        (name = "organizations", description = "Organization directory"),
        (name = "reviews", description = "Student reviews"),
        (name = "reference", description = "Reference lookup tables"),
        (name = "live", description = "Server-sent event feeds of record lists"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
