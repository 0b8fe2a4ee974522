//! Sign-in, session inspection and sign-out.
//!
//! ```text
//! POST   /api/v1/session {"idToken":"..."}
//! GET    /api/v1/session
//! DELETE /api/v1/session
//! ```
//!
//! A fresh ID token runs the access gate once. A granted run stores the
//! principal in the cookie session; a denied run clears the session so the
//! client is signed out.

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::ports::IdToken;
use crate::domain::{ApiResult, EmailAddress, Error, GateState, Principal, Role, UserId};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error};

/// Sign-in request body for `POST /api/v1/session`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Signed-in caller as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub user_id: UserId,
    pub email: EmailAddress,
    pub role: Role,
}

impl From<Principal> for SessionView {
    fn from(principal: Principal) -> Self {
        Self {
            user_id: principal.user_id,
            email: principal.email,
            role: principal.role,
        }
    }
}

/// Response to a granted sign-in.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub session: SessionView,
    /// Gate states visited while admitting the token.
    pub transitions: Vec<GateState>,
}

/// Run the access gate for an ID token and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/session",
    request_body = SignInRequest,
    responses(
        (status = 200, description = "Session established", body = SignInResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Missing token", body = Error),
        (status = 401, description = "Token rejected", body = Error),
        (status = 403, description = "Account holds no role; signed out", body = Error),
        (status = 503, description = "Identity provider unavailable", body = Error)
    ),
    tags = ["session"],
    operation_id = "signIn",
    security([])
)]
#[post("/session")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignInRequest>,
) -> ApiResult<web::Json<SignInResponse>> {
    let token = payload
        .into_inner()
        .id_token
        .map(IdToken::new)
        .filter(|token| !token.is_blank())
        .ok_or_else(|| missing_field_error(FieldName::new("idToken")))?;

    let run = match state.gate.admit(&token).await {
        Ok(run) => run,
        Err(error) => {
            session.sign_out();
            return Err(error);
        }
    };
    let Some(principal) = run.principal() else {
        info!(uid = %run.identity().uid, state = ?run.state(), "sign-in denied");
        session.sign_out();
        return Err(Error::permission_denied(
            "account holds no role; contact an administrator",
        ));
    };

    session.establish(&principal)?;
    info!(uid = %principal.user_id, role = %principal.role, "session established");
    Ok(web::Json(SignInResponse {
        session: principal.into(),
        transitions: run.transitions().to_vec(),
    }))
}

/// Principal held by the current session.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses(
        (status = 200, description = "Current session", body = SessionView),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["session"],
    operation_id = "currentSession"
)]
#[get("/session")]
pub async fn current_session(session: SessionContext) -> ApiResult<web::Json<SessionView>> {
    Ok(web::Json(session.require_principal()?.into()))
}

/// Clear the session cookie.
#[utoipa::path(
    delete,
    path = "/api/v1/session",
    responses((status = 204, description = "Signed out")),
    tags = ["session"],
    operation_id = "signOut",
    security([])
)]
#[delete("/session")]
pub async fn sign_out(session: SessionContext) -> HttpResponse {
    session.sign_out();
    HttpResponse::NoContent().finish()
}
