//! Server-sent event feeds mirroring the record lists.
//!
//! ```text
//! GET /api/v1/live/organizations
//! GET /api/v1/live/organizations/{id}/reviews
//! GET /api/v1/live/users
//! GET /api/v1/live/invitations
//! ```
//!
//! Each stream opens with the current list and sends the whole list again
//! after every committed change, as one `snapshot` event per message.
//! Reviews arrive redacted for the subscriber.

use actix_web::{HttpResponse, get, web};
use futures_util::stream::{self, Stream};
use serde::Serialize;

use crate::domain::{ApiResult, LiveFeed, OrganizationId};
use crate::inbound::http::cache_control::private_no_cache_header;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_record_id};

const ORGANIZATION_ID: FieldName = FieldName::new("organizationId");

/// Media type of every feed.
pub const EVENT_STREAM: &str = "text/event-stream";

fn snapshot_event<T: Serialize>(items: &[T]) -> Result<web::Bytes, serde_json::Error> {
    let data = serde_json::to_string(items)?;
    Ok(web::Bytes::from(format!("event: snapshot\ndata: {data}\n\n")))
}

/// Turn a feed into an event stream that ends when the list goes away.
pub fn snapshot_stream<T>(
    mut feed: LiveFeed<T>,
) -> impl Stream<Item = Result<web::Bytes, serde_json::Error>>
where
    T: Serialize + 'static,
{
    let first = feed.current();
    stream::unfold((feed, Some(first)), |(mut feed, pending)| async move {
        let items = match pending {
            Some(items) => items,
            None => feed.next().await?,
        };
        Some((snapshot_event(&items), (feed, None)))
    })
}

fn event_response<T>(feed: LiveFeed<T>) -> HttpResponse
where
    T: Serialize + 'static,
{
    HttpResponse::Ok()
        .content_type(EVENT_STREAM)
        .insert_header(private_no_cache_header())
        .streaming(snapshot_stream(feed))
}

/// Organizations visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/live/organizations",
    responses(
        (
            status = 200,
            description = "Event stream of organization lists",
            content_type = "text/event-stream",
            body = String
        ),
        (status = 401, description = "Not signed in", body = crate::domain::Error),
        (status = 403, description = "No role", body = crate::domain::Error)
    ),
    tags = ["live"],
    operation_id = "watchOrganizations"
)]
#[get("/live/organizations")]
pub async fn watch_organizations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let viewer = session.require_principal()?;
    let feed = state.organizations.watch(&viewer).await?;
    Ok(event_response(feed))
}

/// Reviews of one organization, redacted for the caller.
#[utoipa::path(
    get,
    path = "/api/v1/live/organizations/{id}/reviews",
    params(("id" = String, Path, description = "Organization id")),
    responses(
        (
            status = 200,
            description = "Event stream of review lists",
            content_type = "text/event-stream",
            body = String
        ),
        (status = 401, description = "Not signed in", body = crate::domain::Error),
        (
            status = 404,
            description = "Unknown or not visible organization",
            body = crate::domain::Error
        )
    ),
    tags = ["live"],
    operation_id = "watchReviews"
)]
#[get("/live/organizations/{id}/reviews")]
pub async fn watch_reviews(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let viewer = session.require_principal()?;
    let organization: OrganizationId = parse_record_id(&path.into_inner(), ORGANIZATION_ID)?;
    let feed = state.reviews.watch(&viewer, &organization).await?;
    Ok(event_response(feed))
}

/// Every user. Administrators only.
#[utoipa::path(
    get,
    path = "/api/v1/live/users",
    responses(
        (
            status = 200,
            description = "Event stream of user lists",
            content_type = "text/event-stream",
            body = String
        ),
        (status = 403, description = "Administrator role required", body = crate::domain::Error)
    ),
    tags = ["live"],
    operation_id = "watchUsers"
)]
#[get("/live/users")]
pub async fn watch_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let caller = session.require_principal()?;
    let feed = state.users.watch_users(&caller).await?;
    Ok(event_response(feed))
}

/// Pending invitations. Administrators only.
#[utoipa::path(
    get,
    path = "/api/v1/live/invitations",
    responses(
        (
            status = 200,
            description = "Event stream of invitation lists",
            content_type = "text/event-stream",
            body = String
        ),
        (status = 403, description = "Administrator role required", body = crate::domain::Error)
    ),
    tags = ["live"],
    operation_id = "watchInvitations"
)]
#[get("/live/invitations")]
pub async fn watch_invitations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let caller = session.require_principal()?;
    let feed = state.users.watch_invitations(&caller).await?;
    Ok(event_response(feed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, LiveList, Role};
    use crate::inbound::http::test_utils::{TestPorts, sign_in, test_app};
    use crate::test_support::principal;
    use actix_web::body::MessageBody;
    use actix_web::http::{StatusCode, header};
    use actix_web::test;
    use futures_util::StreamExt;
    use rstest::rstest;

    fn configure(cfg: &mut web::ServiceConfig) {
        cfg.service(watch_organizations)
            .service(watch_reviews)
            .service(watch_users)
            .service(watch_invitations);
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Row {
        id: u32,
    }

    impl crate::domain::Keyed for Row {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
    }

    #[rstest]
    #[tokio::test]
    async fn streams_open_with_the_current_list_and_follow_changes() {
        let list = LiveList::new(vec![Row { id: 1 }]);
        let mut events = Box::pin(snapshot_stream(list.unfiltered_feed()));

        let first = events.next().await.expect("opening event").expect("encoded");
        assert_eq!(&first[..], b"event: snapshot\ndata: [{\"id\":1}]\n\n");

        list.insert(Row { id: 2 });
        let second = events.next().await.expect("change event").expect("encoded");
        assert_eq!(
            &second[..],
            b"event: snapshot\ndata: [{\"id\":1},{\"id\":2}]\n\n"
        );

        drop(list);
        assert!(events.next().await.is_none(), "stream ends with the list");
    }

    #[actix_web::test]
    async fn organization_feed_is_served_as_an_event_stream() {
        let list = LiveList::new(Vec::new());
        let feed = list.unfiltered_feed();
        let mut ports = TestPorts::default();
        ports
            .organizations
            .expect_watch()
            .return_once(move |_| Ok(feed));
        let app = test::init_service(test_app(ports.into_state(None), configure)).await;
        let cookie = sign_in(&app, &principal("ada@inst.edu", Role::Student)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/live/organizations")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some(EVENT_STREAM)
        );
        let mut body = Box::pin(res.into_body());
        let first = std::future::poll_fn(|cx| body.as_mut().poll_next(cx)).await;
        let Some(Ok(bytes)) = first else {
            panic!("expected an opening event");
        };
        assert_eq!(&bytes[..], b"event: snapshot\ndata: []\n\n");
        drop(list);
    }

    #[actix_web::test]
    async fn students_are_refused_the_user_feed() {
        let mut ports = TestPorts::default();
        ports
            .users
            .expect_watch_users()
            .return_once(|_| Err(Error::permission_denied("administrator role required")));
        let app = test::init_service(test_app(ports.into_state(None), configure)).await;
        let cookie = sign_in(&app, &principal("ada@inst.edu", Role::Student)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/live/users")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn review_feeds_need_a_valid_organization_id() {
        let mut ports = TestPorts::default();
        ports.reviews.expect_watch().never();
        let app = test::init_service(test_app(ports.into_state(None), configure)).await;
        let cookie = sign_in(&app, &principal("ada@inst.edu", Role::Student)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/api/v1/live/organizations/not-an-id/reviews")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
