//! Admin dashboard counters.

use actix_web::{get, web};

use crate::domain::{AdminStatistics, ApiResult, Error};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Record counts for the admin dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/stats",
    responses(
        (status = 200, description = "Dashboard counters", body = AdminStatistics),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Administrator role required", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "adminStatistics"
)]
#[get("/stats")]
pub async fn statistics(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<AdminStatistics>> {
    let caller = session.require_principal()?;
    Ok(web::Json(state.dashboard.statistics(&caller).await?))
}
