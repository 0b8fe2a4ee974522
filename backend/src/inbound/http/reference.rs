//! Reference table snapshot and refresh.
//!
//! ```text
//! GET  /api/v1/reference
//! POST /api/v1/reference/refresh
//! ```

use actix_web::{HttpResponse, get, post, web};

use crate::domain::{ApiResult, Error, ReferenceSnapshot};
use crate::inbound::http::cache_control::{private_no_cache_header, reference_cache_header};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Every reference table plus the approved organization names.
///
/// The first call after startup loads the tables; concurrent callers share
/// that load.
#[utoipa::path(
    get,
    path = "/api/v1/reference",
    responses(
        (status = 200, description = "Reference snapshot", body = ReferenceSnapshot),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["reference"],
    operation_id = "referenceSnapshot"
)]
#[get("/reference")]
pub async fn snapshot(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    session.require_principal()?;
    let snapshot = state.reference.snapshot().await?;
    Ok(HttpResponse::Ok()
        .insert_header(reference_cache_header())
        .json(snapshot))
}

/// Drop cached tables and load everything again.
#[utoipa::path(
    post,
    path = "/api/v1/reference/refresh",
    responses(
        (status = 200, description = "Reloaded snapshot", body = ReferenceSnapshot),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Administrator role required", body = Error)
    ),
    tags = ["reference"],
    operation_id = "refreshReference"
)]
#[post("/reference/refresh")]
pub async fn refresh(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let caller = session.require_principal()?;
    let reloaded = state.reference.refresh(&caller).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(reloaded))
}
