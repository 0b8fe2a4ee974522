//! Review handlers.
//!
//! ```text
//! GET    /api/v1/organizations/{id}/reviews
//! POST   /api/v1/organizations/{id}/reviews
//! DELETE /api/v1/organizations/{id}/reviews
//! GET    /api/v1/reviews/{id}
//! PUT    /api/v1/reviews/{id}
//! DELETE /api/v1/reviews/{id}
//! ```
//!
//! Anonymous reviews reach other students without a reviewer; the board
//! redacts them per viewer before they get here.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    ApiResult, Error, OrganizationId, Review, ReviewDetail, ReviewDraft, ReviewId, ReviewRecord,
};
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_record_id};

const ORGANIZATION_ID: FieldName = FieldName::new("organizationId");
const REVIEW_ID: FieldName = FieldName::new("id");

/// Result of a bulk review deletion.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedReviews {
    pub deleted: u64,
}

/// Reviews of one organization, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/organizations/{id}/reviews",
    params(("id" = String, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Reviews", body = [Review]),
        (status = 401, description = "Not signed in", body = Error),
        (status = 404, description = "Unknown or not visible organization", body = Error)
    ),
    tags = ["reviews"],
    operation_id = "listReviews"
)]
#[get("/organizations/{id}/reviews")]
pub async fn list_reviews(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let viewer = session.require_principal()?;
    let organization: OrganizationId = parse_record_id(&path.into_inner(), ORGANIZATION_ID)?;
    let reviews = state
        .reviews
        .list_for_organization(&viewer, &organization)
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(reviews))
}

/// Submit a review of an approved organization.
#[utoipa::path(
    post,
    path = "/api/v1/organizations/{id}/reviews",
    params(("id" = String, Path, description = "Organization id")),
    request_body = ReviewDraft,
    responses(
        (status = 201, description = "Review stored", body = ReviewRecord),
        (status = 400, description = "Invalid review", body = Error),
        (status = 403, description = "Organization not open for reviews", body = Error),
        (status = 404, description = "Unknown organization", body = Error)
    ),
    tags = ["reviews"],
    operation_id = "createReview"
)]
#[post("/organizations/{id}/reviews")]
pub async fn create_review(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ReviewDraft>,
) -> ApiResult<HttpResponse> {
    let viewer = session.require_principal()?;
    let organization: OrganizationId = parse_record_id(&path.into_inner(), ORGANIZATION_ID)?;
    let record = state
        .reviews
        .create(&viewer, &organization, payload.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(record))
}

/// Remove every review of an organization. Administrators only.
#[utoipa::path(
    delete,
    path = "/api/v1/organizations/{id}/reviews",
    params(("id" = String, Path, description = "Organization id")),
    responses(
        (status = 200, description = "Reviews removed", body = DeletedReviews),
        (status = 403, description = "Administrator role required", body = Error)
    ),
    tags = ["reviews"],
    operation_id = "deleteOrganizationReviews"
)]
#[delete("/organizations/{id}/reviews")]
pub async fn delete_organization_reviews(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeletedReviews>> {
    let caller = session.require_principal()?;
    let organization: OrganizationId = parse_record_id(&path.into_inner(), ORGANIZATION_ID)?;
    let deleted = state
        .reviews
        .delete_for_organization(&caller, &organization)
        .await?;
    Ok(web::Json(DeletedReviews { deleted }))
}

/// One review with its address and display labels.
#[utoipa::path(
    get,
    path = "/api/v1/reviews/{id}",
    params(("id" = String, Path, description = "Review id")),
    responses(
        (status = 200, description = "Review", body = ReviewDetail),
        (status = 404, description = "Unknown review", body = Error)
    ),
    tags = ["reviews"],
    operation_id = "getReview"
)]
#[get("/reviews/{id}")]
pub async fn get_review(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let viewer = session.require_principal()?;
    let id: ReviewId = parse_record_id(&path.into_inner(), REVIEW_ID)?;
    let record = state.reviews.get(&viewer, &id).await?;
    Ok(HttpResponse::Ok()
        .insert_header(private_no_cache_header())
        .json(record))
}

/// Edit a review. Authors and administrators only.
#[utoipa::path(
    put,
    path = "/api/v1/reviews/{id}",
    params(("id" = String, Path, description = "Review id")),
    request_body = ReviewDraft,
    responses(
        (status = 200, description = "Review updated", body = ReviewRecord),
        (status = 400, description = "Invalid review", body = Error),
        (status = 403, description = "Not the author", body = Error),
        (status = 404, description = "Unknown review", body = Error)
    ),
    tags = ["reviews"],
    operation_id = "updateReview"
)]
#[put("/reviews/{id}")]
pub async fn update_review(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ReviewDraft>,
) -> ApiResult<web::Json<ReviewRecord>> {
    let viewer = session.require_principal()?;
    let id: ReviewId = parse_record_id(&path.into_inner(), REVIEW_ID)?;
    let record = state
        .reviews
        .update(&viewer, &id, payload.into_inner())
        .await?;
    Ok(web::Json(record))
}

/// Delete a review and its address. Authors and administrators only.
#[utoipa::path(
    delete,
    path = "/api/v1/reviews/{id}",
    params(("id" = String, Path, description = "Review id")),
    responses(
        (status = 204, description = "Review removed"),
        (status = 403, description = "Not the author", body = Error),
        (status = 404, description = "Unknown review", body = Error)
    ),
    tags = ["reviews"],
    operation_id = "deleteReview"
)]
#[delete("/reviews/{id}")]
pub async fn delete_review(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let viewer = session.require_principal()?;
    let id: ReviewId = parse_record_id(&path.into_inner(), REVIEW_ID)?;
    state.reviews.delete(&viewer, &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReviewContent, ReviewLabels, Reviewer, Role};
    use crate::inbound::http::test_utils::{TestPorts, sign_in, test_app};
    use crate::test_support::{fixture_timestamp, principal};
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    fn configure(cfg: &mut web::ServiceConfig) {
        cfg.service(list_reviews)
            .service(create_review)
            .service(delete_organization_reviews)
            .service(get_review)
            .service(update_review)
            .service(delete_review);
    }

    fn review(organization: OrganizationId, reviewer: Option<&str>, anonymous: bool) -> Review {
        Review {
            id: ReviewId::random(),
            organization,
            reviewer: reviewer.map(|email| Reviewer {
                email: crate::domain::EmailAddress::new(email).expect("fixture email"),
            }),
            address: None,
            created_at: fixture_timestamp(),
            content: ReviewContent {
                safety: Some(4),
                anonymous,
                ..ReviewContent::default()
            },
        }
    }

    #[actix_web::test]
    async fn redacted_reviews_omit_the_reviewer() {
        let organization = OrganizationId::random();
        let mut ports = TestPorts::default();
        ports
            .reviews
            .expect_list_for_organization()
            .withf(move |_, requested| *requested == organization)
            .return_once(move |_, _| {
                Ok(vec![
                    review(organization, None, true),
                    review(organization, Some("bo@inst.edu"), false),
                ])
            });
        let app = test::init_service(test_app(ports.into_state(None), configure)).await;
        let cookie = sign_in(&app, &principal("ada@inst.edu", Role::Student)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/organizations/{organization}/reviews"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body[0]["reviewer"], Value::Null);
        assert_eq!(body[0]["safety"], 4);
        assert_eq!(body[1]["reviewer"]["email"], "bo@inst.edu");
    }

    #[actix_web::test]
    async fn reviewing_an_unapproved_organization_is_forbidden() {
        let mut ports = TestPorts::default();
        ports.reviews.expect_create().return_once(|_, _, _| {
            Err(Error::permission_denied("organization is not open for reviews"))
        });
        let app = test::init_service(test_app(ports.into_state(None), configure)).await;
        let cookie = sign_in(&app, &principal("ada@inst.edu", Role::Student)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/api/v1/organizations/{}/reviews", OrganizationId::random()))
                .cookie(cookie)
                .set_json(json!({"safety": 5, "anonymous": false}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn bulk_delete_reports_the_count() {
        let mut ports = TestPorts::default();
        ports
            .reviews
            .expect_delete_for_organization()
            .times(1)
            .return_once(|_, _| Ok(3));
        let app = test::init_service(test_app(ports.into_state(None), configure)).await;
        let cookie = sign_in(&app, &principal("root@inst.edu", Role::Admin)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/v1/organizations/{}/reviews", OrganizationId::random()))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body, json!({"deleted": 3}));
    }

    #[actix_web::test]
    async fn updates_forward_the_draft() {
        let organization = OrganizationId::random();
        let stored = review(organization, Some("ada@inst.edu"), false);
        let id = stored.id;
        let mut ports = TestPorts::default();
        ports
            .reviews
            .expect_update()
            .withf(move |_, requested, draft| {
                *requested == id && draft.content.duration.as_deref() == Some("3 months")
            })
            .times(1)
            .return_once(move |_, _, draft| {
                let mut review = stored;
                review.content = draft.content;
                Ok(ReviewRecord {
                    review,
                    address: None,
                })
            });
        let app = test::init_service(test_app(ports.into_state(None), configure)).await;
        let cookie = sign_in(&app, &principal("ada@inst.edu", Role::Student)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::put()
                .uri(&format!("/api/v1/reviews/{id}"))
                .cookie(cookie)
                .set_json(json!({"duration": "3 months", "anonymous": false}))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["review"]["duration"], "3 months");
    }

    #[actix_web::test]
    async fn details_flatten_the_record_beside_its_labels() {
        let stored = review(OrganizationId::random(), Some("ada@inst.edu"), false);
        let id = stored.id;
        let mut ports = TestPorts::default();
        ports.reviews.expect_get().return_once(move |_, _| {
            Ok(ReviewDetail {
                record: ReviewRecord {
                    review: stored,
                    address: None,
                },
                labels: ReviewLabels {
                    region: "Coast".to_owned(),
                    languages: vec!["Swahili".to_owned()],
                    sectors: Vec::new(),
                    address_country: "-".to_owned(),
                },
            })
        });
        let app = test::init_service(test_app(ports.into_state(None), configure)).await;
        let cookie = sign_in(&app, &principal("ada@inst.edu", Role::Student)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/api/v1/reviews/{id}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["review"]["safety"], 4);
        assert_eq!(body["labels"]["region"], "Coast");
        assert_eq!(body["labels"]["languages"], json!(["Swahili"]));
        assert_eq!(body["labels"]["addressCountry"], "-");
    }

    #[actix_web::test]
    async fn deleting_a_missing_review_is_not_found() {
        let mut ports = TestPorts::default();
        ports
            .reviews
            .expect_delete()
            .return_once(|_, id| Err(Error::not_found(format!("no review {id}"))));
        let app = test::init_service(test_app(ports.into_state(None), configure)).await;
        let cookie = sign_in(&app, &principal("ada@inst.edu", Role::Student)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::delete()
                .uri(&format!("/api/v1/reviews/{}", ReviewId::random()))
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
