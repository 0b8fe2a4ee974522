//! Allow-list administration.
//!
//! ```text
//! GET    /api/v1/invitations
//! POST   /api/v1/invitations {"email":"ada@berkeley.edu","role":"STUDENT","name":"Ada"}
//! DELETE /api/v1/invitations/{email}
//! ```

use actix_web::{HttpResponse, delete, get, post, web};

use crate::domain::ports::InvitationRequest;
use crate::domain::{AllowListEntry, ApiResult, Error};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_email};

/// Pending invitations ordered by email.
#[utoipa::path(
    get,
    path = "/api/v1/invitations",
    responses(
        (status = 200, description = "Pending invitations", body = [AllowListEntry]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Administrator role required", body = Error)
    ),
    tags = ["invitations"],
    operation_id = "listInvitations"
)]
#[get("/invitations")]
pub async fn list_invitations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<AllowListEntry>>> {
    let caller = session.require_principal()?;
    Ok(web::Json(state.users.list_invitations(&caller).await?))
}

/// Invite an institution address. Re-inviting replaces the pending entry.
#[utoipa::path(
    post,
    path = "/api/v1/invitations",
    request_body = InvitationRequest,
    responses(
        (status = 201, description = "Invitation stored", body = AllowListEntry),
        (status = 400, description = "Invalid body", body = Error),
        (status = 403, description = "Not an administrator or outside the institution", body = Error),
        (status = 409, description = "Address already belongs to a user", body = Error)
    ),
    tags = ["invitations"],
    operation_id = "createInvitation"
)]
#[post("/invitations")]
pub async fn create_invitation(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<InvitationRequest>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_principal()?;
    let entry = state.users.invite(&caller, payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(entry))
}

/// Withdraw a pending invitation.
#[utoipa::path(
    delete,
    path = "/api/v1/invitations/{email}",
    params(("email" = String, Path, description = "Invited address")),
    responses(
        (status = 204, description = "Invitation withdrawn"),
        (status = 403, description = "Administrator role required", body = Error),
        (status = 404, description = "No pending invitation", body = Error)
    ),
    tags = ["invitations"],
    operation_id = "revokeInvitation"
)]
#[delete("/invitations/{email}")]
pub async fn revoke_invitation(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_principal()?;
    let email = parse_email(&path.into_inner(), FieldName::new("email"))?;
    state.users.revoke_invitation(&caller, &email).await?;
    Ok(HttpResponse::NoContent().finish())
}
