//! Integration tests for the API.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use real_estate_listings::api::create_router;
use real_estate_listings::api::models::ListingResponse;
use real_estate_listings::app::AppState;
use real_estate_listings::domain::{
    Currency, HealthResponse, HealthStatus, Listing, ListingStatus, Money,
};
use real_estate_listings::test_utils::MockListingStore;

fn create_test_state() -> (Arc<MockListingStore>, Arc<AppState>) {
    let store = Arc::new(MockListingStore::new());
    let state = Arc::new(AppState::new(store.clone(), store.clone()));
    (store, state)
}

fn create_test_router() -> (Arc<MockListingStore>, Router) {
    let (store, state) = create_test_state();
    (store, create_router(state))
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn raw_json_request(method: &str, uri: &str, body: &'static str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn seed(store: &MockListingStore, title: &str) -> Listing {
    let listing = Listing::create(title, Money::from_dollars(250_000), None, None).unwrap();
    store.insert_listing(listing.clone());
    listing
}

#[tokio::test]
async fn test_create_listing_returns_draft() {
    let (store, router) = create_test_router();

    let payload = json!({
        "title": "Test Home",
        "price": {"amount": 500000, "currency": "USD"}
    });

    let response = router
        .oneshot(json_request("POST", "/listings", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let created: ListingResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(created.title, "Test Home");
    assert_eq!(created.status, ListingStatus::Draft);
    assert_eq!(created.price.currency(), Currency::Usd);
    assert!(created.updated_at.is_none());
    assert_eq!(location, format!("/listings/{}", created.id));

    assert_eq!(store.status_of(created.id), Some(ListingStatus::Draft));
}

#[tokio::test]
async fn test_create_listing_with_address() {
    let (_store, router) = create_test_router();

    let payload = json!({
        "title": "Corner House",
        "price": {"amount": 420000.50, "currency": "USD"},
        "description": "Big yard",
        "address": {"street": "1 Main St", "city": "Springfield", "state": "IL", "zipCode": "62704"}
    });

    let response = router
        .oneshot(json_request("POST", "/listings", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["description"], "Big yard");
    assert_eq!(body["address"]["zipCode"], "62704");
    assert_eq!(body["address"]["formatted"], "1 Main St, Springfield, IL 62704");
}

#[tokio::test]
async fn test_create_listing_blank_title_is_bad_request() {
    let (store, router) = create_test_router();

    let payload = json!({
        "title": "   ",
        "price": {"amount": 100000, "currency": "USD"}
    });

    let response = router
        .oneshot(json_request("POST", "/listings", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "invalid_operation");
    assert!(store.get_all_listings().is_empty());
}

#[tokio::test]
async fn test_create_listing_non_positive_price_is_bad_request() {
    let (_store, router) = create_test_router();

    let payload = json!({
        "title": "Free House",
        "price": {"amount": 0, "currency": "USD"}
    });

    let response = router
        .oneshot(json_request("POST", "/listings", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_listing_price_beyond_storage_is_bad_request() {
    let (store, router) = create_test_router();

    for body in [
        r#"{"title": "Sub-cent", "price": {"amount": 0.001, "currency": "USD"}}"#,
        r#"{"title": "Too dear", "price": {"amount": 100000000000000000, "currency": "USD"}}"#,
    ] {
        let response = router
            .clone()
            .oneshot(raw_json_request("POST", "/listings", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");

        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "invalid_operation");
    }
    assert!(store.get_all_listings().is_empty());
}

#[tokio::test]
async fn test_create_listing_price_is_echoed_exactly() {
    let (store, router) = create_test_router();

    let response = router
        .oneshot(raw_json_request(
            "POST",
            "/listings",
            r#"{"title": "Exact", "price": {"amount": 98765432109876.55, "currency": "USD"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(r#""amount":98765432109876.55"#), "{text}");

    let stored = store.get_all_listings();
    assert_eq!(
        stored[0].price().amount(),
        rust_decimal::Decimal::new(9_876_543_210_987_655, 2)
    );
}

#[tokio::test]
async fn test_create_listing_title_too_long_is_unprocessable() {
    let (_store, router) = create_test_router();

    let payload = json!({
        "title": "a".repeat(101),
        "price": {"amount": 100000, "currency": "USD"}
    });

    let response = router
        .oneshot(json_request("POST", "/listings", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "validation_failed");
}

#[tokio::test]
async fn test_create_listing_malformed_json_is_bad_request() {
    let (_store, router) = create_test_router();

    let request = Request::builder()
        .method("POST")
        .uri("/listings")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_unknown_listing_is_not_found() {
    let (_store, router) = create_test_router();

    let response = router
        .oneshot(empty_request("GET", &format!("/listings/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "not_found");
}

#[tokio::test]
async fn test_get_malformed_id_is_not_found() {
    let (_store, router) = create_test_router();

    let response = router
        .oneshot(empty_request("GET", "/listings/not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_listings_empty() {
    let (_store, router) = create_test_router();

    let response = router
        .oneshot(empty_request("GET", "/listings"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_list_listings_filtered_by_status() {
    let (store, router) = create_test_router();

    let draft = seed(&store, "Draft one");
    let mut published = seed(&store, "Published one");
    published.publish().unwrap();
    store.insert_listing(published.clone());

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/listings?status=Published"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let listings: Vec<ListingResponse> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].id, published.id());

    let response = router
        .oneshot(empty_request("GET", "/listings"))
        .await
        .unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let listings: Vec<ListingResponse> = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(listings.len(), 2);
    assert!(listings.iter().any(|l| l.id == draft.id()));
}

#[tokio::test]
async fn test_list_listings_unknown_status_is_bad_request() {
    let (_store, router) = create_test_router();

    let response = router
        .oneshot(empty_request("GET", "/listings?status=Sold"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_publish_twice_is_rejected() {
    let (store, router) = create_test_router();
    let listing = seed(&store, "Test");
    let uri = format!("/listings/{}/publish", listing.id());

    let response = router
        .clone()
        .oneshot(empty_request("PATCH", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.status_of(listing.id()), Some(ListingStatus::Published));

    let response = router.oneshot(empty_request("PATCH", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.status_of(listing.id()), Some(ListingStatus::Published));
}

#[tokio::test]
async fn test_archive_draft_is_rejected() {
    let (store, router) = create_test_router();
    let listing = seed(&store, "Test");

    let response = router
        .oneshot(empty_request(
            "PATCH",
            &format!("/listings/{}/archive", listing.id()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.status_of(listing.id()), Some(ListingStatus::Draft));
}

#[tokio::test]
async fn test_transition_unknown_listing_is_not_found() {
    let (_store, router) = create_test_router();

    for action in ["publish", "archive", "reactivate"] {
        let response = router
            .clone()
            .oneshot(empty_request(
                "PATCH",
                &format!("/listings/{}/{action}", Uuid::new_v4()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{action}");
    }
}

#[tokio::test]
async fn test_update_archived_listing_is_rejected() {
    let (store, router) = create_test_router();
    let mut listing = seed(&store, "Test");
    listing.publish().unwrap();
    listing.archive().unwrap();
    store.insert_listing(listing.clone());

    let payload = json!({
        "title": "New title",
        "price": {"amount": 300000, "currency": "USD"}
    });

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/listings/{}", listing.id()),
            &payload,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.get_listing(listing.id()).unwrap().title(), "Test");
}

#[tokio::test]
async fn test_delete_listing() {
    let (store, router) = create_test_router();
    let listing = seed(&store, "Test");
    let uri = format!("/listings/{}", listing.id());

    let response = router
        .clone()
        .oneshot(empty_request("DELETE", &uri))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(store.get_listing(listing.id()).is_none());

    let response = router.oneshot(empty_request("DELETE", &uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_transient_commit_failure_is_retried() {
    let (store, router) = create_test_router();
    store.fail_next_commits(2);

    let payload = json!({
        "title": "Retry Home",
        "price": {"amount": 200000, "currency": "USD"}
    });

    let response = router
        .oneshot(json_request("POST", "/listings", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(store.begin_count(), 3);
    assert_eq!(store.get_all_listings().len(), 1);
}

#[tokio::test]
async fn test_connection_lost_at_commit_is_not_replayed() {
    let (store, router) = create_test_router();
    store.lose_connection_on_next_commits(1);

    let payload = json!({
        "title": "Committed Once",
        "price": {"amount": 200000, "currency": "USD"}
    });

    let response = router
        .oneshot(json_request("POST", "/listings", &payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "internal_error");
    assert_eq!(store.begin_count(), 1);
    assert_eq!(store.get_all_listings().len(), 1);
}

#[tokio::test]
async fn test_database_failure_hides_details() {
    let store = Arc::new(MockListingStore::failing("connection refused on 10.0.0.5"));
    let state = Arc::new(AppState::new(store.clone(), store));
    let router = create_router(state);

    let response = router
        .oneshot(empty_request("GET", "/listings"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"]["type"], "internal_error");
    assert!(!body.to_string().contains("10.0.0.5"));
}

#[tokio::test]
async fn test_health_check_healthy() {
    let (_store, router) = create_test_router();

    let response = router
        .oneshot(empty_request("GET", "/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let health: HealthResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.database, HealthStatus::Healthy);
}

#[tokio::test]
async fn test_readiness_reflects_database() {
    let (store, router) = create_test_router();

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/health/ready"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    store.set_healthy(false);

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/health/ready"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = router
        .oneshot(empty_request("GET", "/health/live"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_without_recorder_is_not_found() {
    let (_store, router) = create_test_router();

    let response = router
        .oneshot(empty_request("GET", "/metrics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
