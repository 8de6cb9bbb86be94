mod common;

use axum::body::Body;
use axum::http::{HeaderValue, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::World;
use tender_service::app::{create_app, AppState};
use tender_service::config::Settings;
use tender_service::domain::AuthorType;

fn router(world: &World) -> Router {
    create_app(AppState::new(world.services.clone(), Settings::default()))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let res = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

#[tokio::test]
async fn ping_answers_ok() {
    let world = World::new();
    let app = router(&world);

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/api/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("x-request-id").is_some());
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn request_id_is_preserved_when_provided() {
    let world = World::new();
    let app = router(&world);

    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/ping")
                .header("x-request-id", HeaderValue::from_static("req-42"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "req-42");
}

#[tokio::test]
async fn tender_lifecycle_over_http() {
    let world = World::new();
    let app = router(&world);

    let (status, tender) = send(
        &app,
        "POST",
        "/api/tenders/new",
        Some(json!({
            "name": "Bridge repair",
            "description": "Repair the river bridge",
            "serviceType": "Construction",
            "organizationId": world.acme,
            "creatorUsername": "alice",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tender["status"], "Created");
    assert_eq!(tender["version"], 1);
    let id = tender["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, "GET", &format!("/api/tenders/{id}/status"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["reason"], "not enough permissions");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tenders/{id}/status?status=Published&username=bob"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Published");

    let (status, body) = send(&app, "GET", &format!("/api/tenders/{id}/status"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Published"));

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tenders/{id}/status?status=Created&username=alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "impossible change the status to the previous one");
    assert_eq!(body["code"], "INVALID_TRANSITION");

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/tenders/{id}/edit?username=alice"),
        Some(json!({ "name": "Bridge rebuild" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 2);
    assert_eq!(body["description"], "Repair the river bridge");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/tenders/{id}/rollback/1?username=alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 3);
    assert_eq!(body["name"], "Bridge repair");

    let (status, body) = send(&app, "GET", "/api/tenders?service_type=Construction", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/api/tenders?service_type=Delivery", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());

    let (status, body) = send(&app, "GET", "/api/tenders/my?username=alice", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], id.as_str());
}

#[tokio::test]
async fn errors_map_to_statuses() {
    let world = World::new();
    let app = router(&world);
    let tender = world.tender("Pipes").await;
    let missing = uuid::Uuid::new_v4();

    // Unknown user
    let (status, body) = send(&app, "GET", "/api/tenders/my?username=mallory", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["reason"], "user not found");

    // Missing username
    let (status, body) = send(&app, "GET", "/api/tenders/my", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "username is empty");

    // Unknown tender
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/tenders/{missing}/status?status=Published&username=alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Unknown organization
    let (status, body) = send(
        &app,
        "POST",
        "/api/tenders/new",
        Some(json!({
            "name": "Roads",
            "description": "Resurface roads",
            "serviceType": "Delivery",
            "organizationId": missing,
            "creatorUsername": "alice",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "ORGANIZATION_NOT_FOUND");

    // Outsider
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/tenders/{}/status?status=Published&username=carol", tender.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Shape validation
    let (status, body) = send(&app, "GET", "/api/tenders?limit=51", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "invalid limit, min = 0, max = 50");

    let (status, _) = send(&app, "GET", "/api/tenders?offset=-1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/tenders?service_type=Plumbing", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/tenders/{}/rollback/0?username=alice", tender.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/tenders/{}/edit?username=alice", tender.id),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "no parameters for edit");

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/tenders/{}/edit?username=alice", tender.id),
        Some(json!({ "name": "x".repeat(101) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "GET", "/api/tenders/not-a-uuid/status", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn bid_decision_over_http_closes_tender() {
    let world = World::new();
    let app = router(&world);
    let tender = world.published_tender("Pipes").await;

    let (status, bid) = send(
        &app,
        "POST",
        "/api/bids/new",
        Some(json!({
            "name": "Offer",
            "description": "Copper pipes, two weeks",
            "tenderId": tender.id,
            "authorType": "User",
            "authorId": world.freelancer,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bid["status"], "Created");
    assert!(bid.get("decision").is_none());
    let id = bid["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/bids/{id}/submit_decision?decision=Approved&username=alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/bids/{id}/status?status=Published&username=freelancer"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/bids/list/{}?username=bob", tender.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], id.as_str());

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/bids/{id}/status?username=freelancer"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Published"));

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/bids/{id}/submit_decision?decision=Approved&username=alice"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["decision"], "Approved");

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/tenders/{}/status?username=alice", tender.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("Closed"));
}

#[tokio::test]
async fn bid_edit_and_rollback_over_http() {
    let world = World::new();
    let app = router(&world);
    let tender = world.published_tender("Pipes").await;
    let bid = world
        .bid(tender.id, AuthorType::Organization, world.carol)
        .await;

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/bids/{}/edit?username=dave", bid.id),
        Some(json!({ "description": "Cheaper now" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 2);
    assert_eq!(body["authorType"], "Organization");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/bids/{}/rollback/2?username=carol", bid.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_ROLLBACK_TARGET");

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/bids/{}/rollback/1?username=carol", bid.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 3);
    assert_eq!(body["description"], bid.description.as_str());

    let (status, body) = send(&app, "GET", "/api/bids/my?username=carol", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/bids/{}/status?status=Withdrawn&username=carol", bid.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
