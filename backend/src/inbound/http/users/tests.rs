//! Tests for the user administration handlers.

use super::*;
use crate::domain::{EmailAddress, ErrorCode, Role, UserId};
use crate::inbound::http::test_utils::{TestPorts, sign_in, test_app};
use crate::test_support::{fixture_timestamp, principal};
use actix_web::http::StatusCode;
use actix_web::test;
use rstest::rstest;
use serde_json::{Value, json};

fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_users)
        .service(provisioning)
        .service(update_user)
        .service(delete_user);
}

fn user(id: &str, email: &str, role: Role) -> User {
    User {
        id: UserId::new(id).expect("fixture id"),
        email: EmailAddress::new(email).expect("fixture email"),
        name: "Fixture".to_owned(),
        role,
        created_at: fixture_timestamp(),
        last_access_at: None,
        access_count: 0,
    }
}

fn admin() -> crate::domain::Principal {
    principal("root@inst.edu", Role::Admin)
}

#[actix_web::test]
async fn lists_users_for_admins() {
    let mut ports = TestPorts::default();
    ports.users.expect_list_users().times(1).return_once(|_| {
        Ok(vec![
            user("uid-ada", "ada@inst.edu", Role::Student),
            user("uid-root", "root@inst.edu", Role::Admin),
        ])
    });
    let app = test::init_service(test_app(ports.into_state(None), configure)).await;
    let cookie = sign_in(&app, &admin()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    let ids: Vec<&str> = body
        .as_array()
        .expect("array body")
        .iter()
        .filter_map(|user| user["id"].as_str())
        .collect();
    assert_eq!(ids, ["uid-ada", "uid-root"]);
}

#[actix_web::test]
async fn students_receive_forbidden() {
    let mut ports = TestPorts::default();
    ports
        .users
        .expect_list_users()
        .return_once(|caller| caller.require_admin().map(|()| Vec::new()));
    let app = test::init_service(test_app(ports.into_state(None), configure)).await;
    let cookie = sign_in(&app, &principal("ada@inst.edu", Role::Student)).await;

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["code"], ErrorCode::PermissionDenied.as_str());
}

#[actix_web::test]
async fn updates_email_and_role() {
    let mut ports = TestPorts::default();
    ports
        .users
        .expect_update_user()
        .withf(|_, id, update| {
            id.as_ref() == "uid-ada"
                && update.role == Role::Admin
                && update.email.as_ref() == "ada.l@inst.edu"
        })
        .times(1)
        .return_once(|_, _, update| Ok(user("uid-ada", update.email.as_ref(), update.role)));
    let app = test::init_service(test_app(ports.into_state(None), configure)).await;
    let cookie = sign_in(&app, &admin()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/api/v1/users/uid-ada")
            .cookie(cookie)
            .set_json(json!({"email": "ada.l@inst.edu", "role": "ADMIN"}))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["role"], "ADMIN");
}

#[rstest]
#[case::deleted(Ok(()), StatusCode::NO_CONTENT)]
#[case::provider_down(Err(Error::unavailable("identity provider unreachable")), StatusCode::SERVICE_UNAVAILABLE)]
#[actix_web::test]
async fn delete_reports_the_outcome(
    #[case] outcome: Result<(), Error>,
    #[case] expected: StatusCode,
) {
    let mut ports = TestPorts::default();
    ports
        .users
        .expect_delete_user()
        .withf(|_, id| id.as_ref() == "uid-gone")
        .times(1)
        .return_once(move |_, _| outcome);
    let app = test::init_service(test_app(ports.into_state(None), configure)).await;
    let cookie = sign_in(&app, &admin()).await;

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri("/api/v1/users/uid-gone")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), expected);
}

#[actix_web::test]
async fn provisioning_state_is_admin_only() {
    let mut ports = TestPorts::default();
    ports
        .claims
        .expect_provisioning_state()
        .times(1)
        .return_once(|_| Ok(ProvisioningState::Claimed(Role::Student)));
    let app = test::init_service(test_app(ports.into_state(None), configure)).await;

    let student = sign_in(&app, &principal("ada@inst.edu", Role::Student)).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/uid-ada/provisioning")
            .cookie(student)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let cookie = sign_in(&app, &admin()).await;
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/v1/users/uid-ada/provisioning")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body, json!({"state": "CLAIMED", "role": "STUDENT"}));
}
