//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod cache_control;
pub mod claims;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod identity_hooks;
pub mod invitations;
pub mod live;
pub mod organizations;
pub mod reference;
pub mod reviews;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub(crate) mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use orgreviews::inbound::http::api_routes;
///
/// let app = App::new().service(web::scope("/api/v1").configure(api_routes));
/// ```
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(identity_hooks::before_create)
        .service(identity_hooks::before_sign_in)
        .service(auth::sign_in)
        .service(auth::current_session)
        .service(auth::sign_out)
        .service(claims::set_claims)
        .service(users::list_users)
        .service(users::provisioning)
        .service(users::update_user)
        .service(users::delete_user)
        .service(invitations::list_invitations)
        .service(invitations::create_invitation)
        .service(invitations::revoke_invitation)
        .service(dashboard::statistics)
        .service(organizations::list_organizations)
        .service(organizations::create_organization)
        .service(organizations::get_organization)
        .service(organizations::update_organization)
        .service(organizations::set_approval)
        .service(organizations::delete_organization)
        .service(reviews::list_reviews)
        .service(reviews::create_review)
        .service(reviews::delete_organization_reviews)
        .service(reviews::get_review)
        .service(reviews::update_review)
        .service(reviews::delete_review)
        .service(reference::snapshot)
        .service(reference::refresh)
        .service(live::watch_organizations)
        .service(live::watch_reviews)
        .service(live::watch_users)
        .service(live::watch_invitations);
}
