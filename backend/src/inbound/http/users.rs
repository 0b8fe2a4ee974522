//! User administration handlers.
//!
//! ```text
//! GET    /api/v1/users
//! PUT    /api/v1/users/{uid} {"email":"...","role":"ADMIN"}
//! DELETE /api/v1/users/{uid}
//! GET    /api/v1/users/{uid}/provisioning
//! ```
//!
//! Every route requires an administrator; the services enforce the role and
//! the handlers only resolve the caller from the session.

use actix_web::{HttpResponse, delete, get, put, web};

use crate::domain::ports::UserUpdate;
use crate::domain::{ApiResult, Error, ProvisioningState, User};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_user_id};

const UID: FieldName = FieldName::new("uid");

/// List provisioned users ordered by name.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users", body = [User]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Administrator role required", body = Error),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<User>>> {
    let caller = session.require_principal()?;
    Ok(web::Json(state.users.list_users(&caller).await?))
}

/// Change a user's email and role.
///
/// The provider claims are rewritten to match, so a demoted user loses access
/// at their next sign-in.
#[utoipa::path(
    put,
    path = "/api/v1/users/{uid}",
    params(("uid" = String, Path, description = "Identity provider user id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Invalid uid or body", body = Error),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Administrator role required", body = Error),
        (status = 404, description = "No such user", body = Error),
        (status = 409, description = "Email already in use", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/users/{uid}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UserUpdate>,
) -> ApiResult<web::Json<User>> {
    let caller = session.require_principal()?;
    let uid = parse_user_id(&path.into_inner(), UID)?;
    let user = state
        .users
        .update_user(&caller, &uid, payload.into_inner())
        .await?;
    Ok(web::Json(user))
}

/// Delete the user document and the provider account.
///
/// Deleting a user that no longer exists succeeds.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{uid}",
    params(("uid" = String, Path, description = "Identity provider user id")),
    responses(
        (status = 204, description = "User removed"),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Administrator role required", body = Error),
        (status = 503, description = "Identity provider unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{uid}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let caller = session.require_principal()?;
    let uid = parse_user_id(&path.into_inner(), UID)?;
    state.users.delete_user(&caller, &uid).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Compare the stored role with the provider claims for one account.
#[utoipa::path(
    get,
    path = "/api/v1/users/{uid}/provisioning",
    params(("uid" = String, Path, description = "Identity provider user id")),
    responses(
        (status = 200, description = "Provisioning state, e.g. {\"state\":\"CLAIMED\",\"role\":\"STUDENT\"}"),
        (status = 401, description = "Not signed in", body = Error),
        (status = 403, description = "Administrator role required", body = Error)
    ),
    tags = ["users"],
    operation_id = "userProvisioning"
)]
#[get("/users/{uid}/provisioning")]
pub async fn provisioning(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ProvisioningState>> {
    let caller = session.require_principal()?;
    caller.require_admin()?;
    let uid = parse_user_id(&path.into_inner(), UID)?;
    Ok(web::Json(state.claims.provisioning_state(&uid).await?))
}

#[cfg(test)]
mod tests;
