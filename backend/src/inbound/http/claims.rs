//! Claims synchronization endpoint.
//!
//! ```text
//! POST /api/v1/claims {"uid":"..."}  ->  {"claims":{"student":true}}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ApiResult, CustomClaims, Error};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, parse_user_id};

/// Request body for `POST /api/v1/claims`.
#[derive(Deserialize, Serialize, ToSchema)]
pub struct SetClaimsRequest {
    #[serde(default)]
    pub uid: Option<String>,
}

/// Claims now held by the account; `null` when they were cleared.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SetClaimsResponse {
    pub claims: Option<CustomClaims>,
}

/// Write the provider claims matching the stored role of `uid`.
///
/// Callers may synchronise their own account; administrators may
/// synchronise anyone.
#[utoipa::path(
    post,
    path = "/api/v1/claims",
    request_body = SetClaimsRequest,
    responses(
        (status = 200, description = "Claims written", body = SetClaimsResponse),
        (status = 400, description = "Missing or invalid uid", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Caller may not touch this account", body = Error),
        (status = 404, description = "No user document", body = Error),
        (status = 503, description = "Identity provider unavailable", body = Error)
    ),
    tags = ["claims"],
    operation_id = "setClaims"
)]
#[post("/claims")]
pub async fn set_claims(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SetClaimsRequest>,
) -> ApiResult<web::Json<SetClaimsResponse>> {
    let caller = session.require_principal()?;
    let field = FieldName::new("uid");
    let raw = payload
        .into_inner()
        .uid
        .ok_or_else(|| missing_field_error(field))?;
    let target = parse_user_id(&raw, field)?;
    let claims = state.claims.set_claims(&caller, &target).await?;
    Ok(web::Json(SetClaimsResponse { claims }))
}
