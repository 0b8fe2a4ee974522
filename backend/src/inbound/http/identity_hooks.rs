//! Blocking functions the identity provider calls during account lifecycle.
//!
//! ```text
//! POST /api/v1/identity/before-create    {"email":"...","uid":"...","displayName":"..."}
//! POST /api/v1/identity/before-sign-in   {"email":"...","uid":"..."}
//! ```
//!
//! The provider authenticates with `Authorization: Bearer <hook secret>`.
//! Any error response aborts the account operation on the provider side.

use actix_web::{HttpRequest, http::header, post, web};
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::domain::ports::{AccountCreationEvent, SignInEvent};
use crate::domain::{ApiResult, Error, User};
use crate::inbound::http::state::HttpState;

fn require_hook_secret(req: &HttpRequest, state: &HttpState) -> ApiResult<()> {
    let Some(expected) = state.hook_secret() else {
        warn!("identity hook called without a configured secret");
        return Err(Error::unavailable("identity hooks are not configured"));
    };
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| Error::unauthenticated("missing hook credentials"))?;
    if secrets_match(presented.as_bytes(), expected.as_bytes()) {
        Ok(())
    } else {
        warn!("identity hook called with a wrong secret");
        Err(Error::unauthenticated("invalid hook credentials"))
    }
}

/// Constant-time comparison of the presented and configured secrets.
fn secrets_match(presented: &[u8], expected: &[u8]) -> bool {
    presented.ct_eq(expected).into()
}

/// Provision a user document from an invitation before the account exists.
#[utoipa::path(
    post,
    path = "/api/v1/identity/before-create",
    request_body = AccountCreationEvent,
    responses(
        (status = 200, description = "User provisioned", body = User),
        (status = 400, description = "Missing email or uid", body = Error),
        (status = 401, description = "Missing or wrong hook secret", body = Error),
        (status = 403, description = "Email outside the institution", body = Error),
        (status = 404, description = "No invitation for the email", body = Error),
        (status = 503, description = "Hooks not configured", body = Error)
    ),
    tags = ["identity"],
    operation_id = "beforeCreate",
    security(("HookSecret" = []))
)]
#[post("/identity/before-create")]
pub async fn before_create(
    req: HttpRequest,
    state: web::Data<HttpState>,
    payload: web::Json<AccountCreationEvent>,
) -> ApiResult<web::Json<User>> {
    require_hook_secret(&req, &state)?;
    let user = state.hooks.on_create(payload.into_inner()).await?;
    Ok(web::Json(user))
}

/// Record a sign-in against the stored user document.
#[utoipa::path(
    post,
    path = "/api/v1/identity/before-sign-in",
    request_body = SignInEvent,
    responses(
        (status = 200, description = "Access recorded", body = User),
        (status = 400, description = "Missing email or uid", body = Error),
        (status = 401, description = "Missing or wrong hook secret", body = Error),
        (status = 404, description = "No user document", body = Error),
        (status = 503, description = "Hooks not configured", body = Error)
    ),
    tags = ["identity"],
    operation_id = "beforeSignIn",
    security(("HookSecret" = []))
)]
#[post("/identity/before-sign-in")]
pub async fn before_sign_in(
    req: HttpRequest,
    state: web::Data<HttpState>,
    payload: web::Json<SignInEvent>,
) -> ApiResult<web::Json<User>> {
    require_hook_secret(&req, &state)?;
    let user = state.hooks.on_sign_in(payload.into_inner()).await?;
    Ok(web::Json(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmailAddress, Role, UserId};
    use crate::inbound::http::test_utils::{TestPorts, test_app};
    use crate::test_support::fixture_timestamp;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rstest::rstest;
    use serde_json::{Value, json};

    const SECRET: &str = "hook-secret";

    fn provisioned_user() -> User {
        User {
            id: UserId::new("uid-ada").expect("fixture id"),
            name: "Ada".to_owned(),
            email: EmailAddress::new("ada@inst.edu").expect("fixture email"),
            role: Role::Student,
            created_at: fixture_timestamp(),
            last_access_at: None,
            access_count: 0,
        }
    }

    fn configure(cfg: &mut web::ServiceConfig) {
        cfg.service(before_create).service(before_sign_in);
    }

    async fn call_create(
        ports: TestPorts,
        secret: Option<&str>,
        auth: Option<&str>,
    ) -> (StatusCode, Value) {
        let app = test::init_service(test_app(ports.into_state(secret), configure)).await;
        let mut req = test::TestRequest::post()
            .uri("/api/v1/identity/before-create")
            .set_json(json!({"email": "ada@inst.edu", "uid": "uid-ada", "displayName": "Ada"}));
        if let Some(auth) = auth {
            req = req.insert_header((header::AUTHORIZATION, auth));
        }
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        (status, test::read_body_json(res).await)
    }

    #[actix_web::test]
    async fn create_hook_forwards_the_event() {
        let mut ports = TestPorts::default();
        ports
            .hooks
            .expect_on_create()
            .withf(|event| {
                event.email.as_deref() == Some("ada@inst.edu")
                    && event.display_name.as_deref() == Some("Ada")
            })
            .times(1)
            .return_once(|_| Ok(provisioned_user()));

        let (status, body) = call_create(ports, Some(SECRET), Some("Bearer hook-secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "uid-ada");
        assert_eq!(body["role"], "STUDENT");
    }

    #[rstest]
    #[case::missing_header(Some(SECRET), None, StatusCode::UNAUTHORIZED)]
    #[case::wrong_secret(Some(SECRET), Some("Bearer nope"), StatusCode::UNAUTHORIZED)]
    #[case::secret_prefix(Some(SECRET), Some("Bearer hook-secret-extra"), StatusCode::UNAUTHORIZED)]
    #[case::wrong_scheme(Some(SECRET), Some("Basic hook-secret"), StatusCode::UNAUTHORIZED)]
    #[case::not_configured(None, Some("Bearer hook-secret"), StatusCode::SERVICE_UNAVAILABLE)]
    #[actix_web::test]
    async fn create_hook_requires_the_secret(
        #[case] secret: Option<&str>,
        #[case] auth: Option<&str>,
        #[case] expected: StatusCode,
    ) {
        let (status, _) = call_create(TestPorts::default(), secret, auth).await;
        assert_eq!(status, expected);
    }

    #[actix_web::test]
    async fn domain_rejections_abort_account_creation() {
        let mut ports = TestPorts::default();
        ports
            .hooks
            .expect_on_create()
            .return_once(|_| Err(Error::permission_denied("unauthorized email")));
        let (status, body) = call_create(ports, Some(SECRET), Some("Bearer hook-secret")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "permission-denied");
    }

    #[actix_web::test]
    async fn sign_in_hook_returns_the_updated_user() {
        let mut ports = TestPorts::default();
        ports.hooks.expect_on_sign_in().times(1).return_once(|_| {
            let mut user = provisioned_user();
            user.access_count = 1;
            user.last_access_at = Some(fixture_timestamp());
            Ok(user)
        });
        let app = test::init_service(test_app(ports.into_state(Some(SECRET)), configure)).await;
        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/identity/before-sign-in")
                .insert_header((header::AUTHORIZATION, "Bearer hook-secret"))
                .set_json(json!({"email": "ada@inst.edu", "uid": "uid-ada"}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["accessCount"], 1);
    }

    #[rstest]
    #[case(b"abc", b"abc", true)]
    #[case(b"abc", b"abd", false)]
    #[case(b"ab", b"abc", false)]
    #[case(b"", b"abc", false)]
    #[case(b"abc\0", b"abc", false)]
    #[::core::prelude::v1::test]
    fn secret_comparison(#[case] presented: &[u8], #[case] expected: &[u8], #[case] equal: bool) {
        assert_eq!(secrets_match(presented, expected), equal);
    }
}
