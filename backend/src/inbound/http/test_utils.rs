//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, web};

use crate::domain::ports::{
    MockClaimsCommand, MockDashboardQuery, MockIdentityHooks, MockOrganizationDirectory,
    MockReferenceQuery, MockReviewBoard, MockSessionGate, MockUserAdministration,
};
use crate::domain::{Error, Principal};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Path of the helper route that signs a principal in.
pub const SIGN_IN_PATH: &str = "/__test/sign-in";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Session cookie set by `res`.
pub fn session_cookie(res: &ServiceResponse) -> Cookie<'static> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("response should set a session cookie")
        .into_owned()
}

/// Mock ports with no expectations; tests configure the ones they touch.
#[derive(Default)]
pub struct TestPorts {
    pub hooks: MockIdentityHooks,
    pub gate: MockSessionGate,
    pub claims: MockClaimsCommand,
    pub users: MockUserAdministration,
    pub dashboard: MockDashboardQuery,
    pub organizations: MockOrganizationDirectory,
    pub reviews: MockReviewBoard,
    pub reference: MockReferenceQuery,
}

impl TestPorts {
    /// Freeze the mocks into handler state.
    pub fn into_state(self, hook_secret: Option<&str>) -> HttpState {
        HttpState::new(
            HttpStatePorts {
                hooks: Arc::new(self.hooks),
                gate: Arc::new(self.gate),
                claims: Arc::new(self.claims),
                users: Arc::new(self.users),
                dashboard: Arc::new(self.dashboard),
                organizations: Arc::new(self.organizations),
                reviews: Arc::new(self.reviews),
                reference: Arc::new(self.reference),
            },
            hook_secret.map(str::to_owned),
        )
    }
}

/// App with session middleware, `state`, the sign-in helper route and
/// everything `configure` registers under `/api/v1`.
pub fn test_app<F>(
    state: HttpState,
    configure: F,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    F: FnOnce(&mut web::ServiceConfig),
{
    App::new()
        .wrap(test_session_middleware())
        .app_data(web::Data::new(state))
        .route(SIGN_IN_PATH, web::post().to(sign_in_for_test))
        .service(web::scope("/api/v1").configure(configure))
}

async fn sign_in_for_test(
    session: SessionContext,
    principal: web::Json<Principal>,
) -> Result<HttpResponse, Error> {
    session.establish(&principal)?;
    Ok(HttpResponse::NoContent().finish())
}

/// Sign `principal` in through the helper route and return its cookie.
pub async fn sign_in<S>(app: &S, principal: &Principal) -> Cookie<'static>
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let res = actix_web::test::call_service(
        app,
        actix_web::test::TestRequest::post()
            .uri(SIGN_IN_PATH)
            .set_json(principal)
            .to_request(),
    )
    .await;
    session_cookie(&res)
}
