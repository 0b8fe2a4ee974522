//! Organization directory handlers.
//!
//! ```text
//! GET    /api/v1/organizations?name=red&area=DOMESTIC,INTERNATIONAL&sectors=ngo,health
//! POST   /api/v1/organizations
//! GET    /api/v1/organizations/{id}
//! PUT    /api/v1/organizations/{id}
//! DELETE /api/v1/organizations/{id}
//! PUT    /api/v1/organizations/{id}/approval {"approved":true}
//! ```
//!
//! Students only ever see approved organizations; the directory service
//! applies that scope, so handlers pass the session principal through.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ApiResult, Error, Organization, OrganizationDetail, OrganizationDraft, OrganizationFilter,
    OrganizationId, OrganizationRecord,
};
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_areas, parse_csv, parse_record_id};

const ID: FieldName = FieldName::new("id");

/// Directory filter. Omitted parameters match everything.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrganizationQuery {
    /// Case-insensitive substring of the organization name.
    pub name: Option<String>,
    /// Comma-separated `DOMESTIC` and/or `INTERNATIONAL`.
    pub area: Option<String>,
    /// Comma-separated sector codes.
    pub sectors: Option<String>,
}

impl OrganizationQuery {
    fn into_filter(self) -> Result<Option<OrganizationFilter>, Error> {
        let name = self
            .name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        let areas = parse_areas(self.area.as_deref(), FieldName::new("area"))?;
        let sectors = parse_csv(self.sectors.as_deref());
        if name.is_none() && areas.is_none() && sectors.is_none() {
            return Ok(None);
        }
        Ok(Some(OrganizationFilter {
            name,
            areas,
            sectors,
        }))
    }
}

/// Body for `PUT /organizations/{id}/approval`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ApprovalRequest {
    pub approved: bool,
}

/// List or filter organizations visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/organizations",
    params(OrganizationQuery),
    responses(
        (status = 200, description = "Organizations ordered by name", body = [Organization]),
        (status = 400, description = "Unknown area", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Account holds no role", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "listOrganizations"
)]
#[get("/organizations")]
pub async fn list_organizations(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<OrganizationQuery>,
) -> ApiResult<HttpResponse> {
    let viewer = session.require_principal()?;
    let organizations = match query.into_inner().into_filter()? {
        Some(filter) => state.organizations.filter(&viewer, &filter).await?,
        None => state.organizations.list(&viewer).await?,
    };
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(organizations))
}

/// Create an unapproved organization with its address and contacts.
#[utoipa::path(
    post,
    path = "/api/v1/organizations",
    request_body = OrganizationDraft,
    responses(
        (status = 201, description = "Organization stored", body = OrganizationRecord),
        (status = 400, description = "Invalid organization", body = Error),
        (status = 403, description = "Administrator role required", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "createOrganization"
)]
#[post("/organizations")]
pub async fn create_organization(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<OrganizationDraft>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_principal()?;
    let record = state
        .organizations
        .create(&caller, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(record))
}

/// Organization with its address, contacts and display labels.
#[utoipa::path(
    get,
    path = "/api/v1/organizations/{id}",
    params(("id" = String, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Organization detail", body = OrganizationDetail),
        (status = 400, description = "Malformed id", body = Error),
        (status = 404, description = "Unknown or not visible", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "getOrganization"
)]
#[get("/organizations/{id}")]
pub async fn get_organization(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let viewer = session.require_principal()?;
    let id: OrganizationId = parse_record_id(&path.into_inner(), ID)?;
    let detail = state.organizations.get(&viewer, &id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(detail))
}

/// Replace an organization's fields, address and contact list atomically.
#[utoipa::path(
    put,
    path = "/api/v1/organizations/{id}",
    params(("id" = String, Path, description = "Organization id")),
    request_body = OrganizationDraft,
    responses(
        (status = 200, description = "Organization updated", body = OrganizationRecord),
        (status = 400, description = "Invalid organization", body = Error),
        (status = 403, description = "Administrator role required", body = Error),
        (status = 404, description = "Unknown organization", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "updateOrganization"
)]
#[put("/organizations/{id}")]
pub async fn update_organization(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<OrganizationDraft>,
) -> ApiResult<web::Json<OrganizationRecord>> {
    let caller = session.require_principal()?;
    let id: OrganizationId = parse_record_id(&path.into_inner(), ID)?;
    let record = state
        .organizations
        .update(&caller, &id, payload.into_inner())
        .await?;
    Ok(web::Json(record))
}

/// Approve or withdraw approval.
#[utoipa::path(
    put,
    path = "/api/v1/organizations/{id}/approval",
    params(("id" = String, Path, description = "Organization id")),
    request_body = ApprovalRequest,
    responses(
        (status = 200, description = "Approval updated", body = Organization),
        (status = 403, description = "Administrator role required", body = Error),
        (status = 404, description = "Unknown organization", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "setOrganizationApproval"
)]
#[put("/organizations/{id}/approval")]
pub async fn set_approval(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ApprovalRequest>,
) -> ApiResult<web::Json<Organization>> {
    let caller = session.require_principal()?;
    let id: OrganizationId = parse_record_id(&path.into_inner(), ID)?;
    let organization = state
        .organizations
        .set_approval(&caller, &id, payload.approved)
        .await?;
    Ok(web::Json(organization))
}

/// Delete an organization with its address and contacts.
///
/// Reviews are left in place; remove them first with
/// `DELETE /organizations/{id}/reviews`.
#[utoipa::path(
    delete,
    path = "/api/v1/organizations/{id}",
    params(("id" = String, Path, description = "Organization id")),
    responses(
        (status = 204, description = "Organization removed"),
        (status = 403, description = "Administrator role required", body = Error),
        (status = 404, description = "Unknown organization", body = Error)
    ),
    tags = ["organizations"],
    operation_id = "deleteOrganization"
)]
#[delete("/organizations/{id}")]
pub async fn delete_organization(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_principal()?;
    let id: OrganizationId = parse_record_id(&path.into_inner(), ID)?;
    state.organizations.delete(&caller, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}
