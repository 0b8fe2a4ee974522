//! In-process application harness for end-to-end API tests.
//!
//! The full application is assembled with [`build_app`] over the in-memory
//! store and identity provider, so every request exercises the real session
//! middleware, handlers, services and adapters.

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key, SameSite};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{test, web};
use mockable::DefaultClock;
use orgreviews::domain::ports::AllowListRepository;
use orgreviews::domain::{AllowListEntry, EmailAddress, InstitutionDomain, Role, UserId};
use orgreviews::inbound::http::health::HealthState;
use orgreviews::outbound::memory::{InMemoryIdentityProvider, MemoryStore};
use orgreviews::server::{AppDependencies, Backends, ServiceSettings, WiredState, wire_http_state};
use serde_json::{Value, json};

pub const HOOK_SECRET: &str = "hook-secret";
pub const INSTITUTION: &str = "inst.edu";

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub wired: WiredState,
    pub health: web::Data<HealthState>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let identity = Arc::new(InMemoryIdentityProvider::new());
        let wired = wire_http_state(
            Backends {
                users: store.clone(),
                allow_list: store.clone(),
                organizations: store.clone(),
                reviews: store.clone(),
                references: store.clone(),
                identity: identity.clone(),
            },
            ServiceSettings {
                institution: InstitutionDomain::new(INSTITUTION).expect("institution"),
                home_country: "US".to_owned(),
                hook_secret: Some(HOOK_SECRET.to_owned()),
                clock: Arc::new(DefaultClock),
            },
        );
        Self {
            store,
            identity,
            wired,
            health: web::Data::new(HealthState::new()),
        }
    }

    pub fn deps(&self) -> AppDependencies {
        AppDependencies {
            health_state: self.health.clone(),
            http_state: web::Data::new(self.wired.http_state.clone()),
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        }
    }

    /// Put an invitation straight into the store.
    pub async fn invite(&self, email: &str, role: Role) {
        self.store
            .upsert(&AllowListEntry {
                email: EmailAddress::new(email).expect("email"),
                role,
                name: None,
                invited_at: chrono::Utc::now(),
            })
            .await
            .expect("invitation stored");
    }

    /// Register a provider account whose ID token is `token-<local part>`.
    pub async fn register(&self, email: &str) -> Account {
        let local = email.split('@').next().unwrap_or(email);
        let account = Account {
            token: format!("token-{local}"),
            uid: format!("uid-{local}"),
            email: email.to_owned(),
        };
        self.identity
            .register(
                account.token.clone(),
                UserId::new(&account.uid).expect("uid"),
                Some(EmailAddress::new(email).expect("email")),
                Some(local.to_owned()),
            )
            .await;
        account
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub token: String,
    pub uid: String,
    pub email: String,
}

/// Response status, JSON body (`Null` when empty) and any session cookie.
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
    pub cookie: Option<Cookie<'static>>,
}

pub async fn send<S, B>(app: &S, req: Request) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req).await;
    let status = res.status();
    let cookie = res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned);
    let bytes = test::read_body(res).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    Reply {
        status,
        body,
        cookie,
    }
}

/// Call the before-create hook for `account`.
pub async fn create_account<S, B>(app: &S, account: &Account) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/identity/before-create")
        .insert_header((header::AUTHORIZATION, format!("Bearer {HOOK_SECRET}")))
        .set_json(json!({
            "email": account.email,
            "uid": account.uid,
            "displayName": account.email.split('@').next(),
        }))
        .to_request();
    send(app, req).await
}

/// Present `account`'s ID token to the access gate.
pub async fn sign_in<S, B>(app: &S, account: &Account) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/session")
        .set_json(json!({ "idToken": account.token }))
        .to_request();
    send(app, req).await
}

/// Provision and sign in an invited account, returning its session cookie.
pub async fn member_session<S, B>(app: &S, account: &Account) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let created = create_account(app, account).await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    let signed_in = sign_in(app, account).await;
    assert_eq!(signed_in.status, StatusCode::OK, "{}", signed_in.body);
    signed_in.cookie.expect("session cookie")
}

pub async fn get<S, B>(app: &S, cookie: &Cookie<'static>, uri: &str) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .cookie(cookie.clone())
        .to_request();
    send(app, req).await
}

pub async fn post<S, B>(app: &S, cookie: &Cookie<'static>, uri: &str, body: Value) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri(uri)
        .cookie(cookie.clone())
        .set_json(body)
        .to_request();
    send(app, req).await
}

pub async fn put<S, B>(app: &S, cookie: &Cookie<'static>, uri: &str, body: Value) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::put()
        .uri(uri)
        .cookie(cookie.clone())
        .set_json(body)
        .to_request();
    send(app, req).await
}

pub async fn delete<S, B>(app: &S, cookie: &Cookie<'static>, uri: &str) -> Reply
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::delete()
        .uri(uri)
        .cookie(cookie.clone())
        .to_request();
    send(app, req).await
}
