use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tanggapin::api::AppState;
use tanggapin::config::Config;
use tower::ServiceExt;

const INTERNAL_KEY: &str = "it-internal-secret";

async fn spawn_app_with_key(api_key: &str) -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.internal.api_key = api_key.to_string();

    let state = tanggapin::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    let app = tanggapin::api::router(state.clone()).await;
    (app, state)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn gap_request(key: Option<&str>, question: &str) -> Request<Body> {
    let payload = serde_json::json!({
        "village_id": 1,
        "question": question,
    });
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/internal/knowledge/gaps")
        .header("content-type", "application/json");
    if let Some(key) = key {
        builder = builder.header("x-internal-api-key", key);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

#[tokio::test]
async fn test_internal_requires_key() {
    let (app, _state) = spawn_app_with_key(INTERNAL_KEY).await;

    let response = app
        .clone()
        .oneshot(gap_request(None, "Bagaimana cara membuat KTP?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(gap_request(Some("wrong-key"), "Bagaimana cara membuat KTP?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_internal_key_format_variants_accepted() {
    let (app, _state) = spawn_app_with_key(INTERNAL_KEY).await;

    for presented in [
        INTERNAL_KEY.to_string(),
        format!("Bearer {INTERNAL_KEY}"),
        format!("\"{INTERNAL_KEY}\""),
        format!("Bearer \"{INTERNAL_KEY}\""),
    ] {
        let response = app
            .clone()
            .oneshot(gap_request(Some(&presented), "Bagaimana cara membuat KTP?"))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::OK,
            "key format rejected: {presented}"
        );
    }
}

#[tokio::test]
async fn test_internal_disabled_when_unconfigured() {
    let (app, _state) = spawn_app_with_key("").await;

    // Fail closed: even an empty presented key must not match.
    let response = app
        .clone()
        .oneshot(gap_request(Some(""), "Bagaimana cara membuat KTP?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(gap_request(Some("anything"), "Bagaimana cara membuat KTP?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_gap_upsert_is_idempotent_by_question() {
    let (app, _state) = spawn_app_with_key(INTERNAL_KEY).await;

    let response = app
        .clone()
        .oneshot(gap_request(Some(INTERNAL_KEY), "Bagaimana cara membuat KTP?"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await;
    assert_eq!(first["data"]["hit_count"], 1);

    // Same question modulo whitespace and case: bumps the counter.
    let response = app
        .clone()
        .oneshot(gap_request(
            Some(INTERNAL_KEY),
            "  bagaimana CARA membuat ktp?  ",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await;
    assert_eq!(second["data"]["id"], first["data"]["id"]);
    assert_eq!(second["data"]["hit_count"], 2);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/internal/knowledge/gaps?village_id=1")
                .header("x-internal-api-key", INTERNAL_KEY)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing = body_json(response).await;
    assert_eq!(listing["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_gaps_are_scoped_per_village() {
    let (app, _state) = spawn_app_with_key(INTERNAL_KEY).await;

    let record = |village_id: i64| {
        let payload = serde_json::json!({
            "village_id": village_id,
            "question": "Bagaimana cara membuat KTP?",
        });
        Request::builder()
            .method("POST")
            .uri("/api/internal/knowledge/gaps")
            .header("content-type", "application/json")
            .header("x-internal-api-key", INTERNAL_KEY)
            .body(Body::from(payload.to_string()))
            .unwrap()
    };

    let first = app.clone().oneshot(record(1)).await.unwrap();
    let second = app.clone().oneshot(record(2)).await.unwrap();

    // Identical question, different villages: separate rows.
    let first = body_json(first).await;
    let second = body_json(second).await;
    assert_ne!(first["data"]["id"], second["data"]["id"]);
    assert_eq!(first["data"]["hit_count"], 1);
    assert_eq!(second["data"]["hit_count"], 1);
}

#[tokio::test]
async fn test_conflict_upsert() {
    let (app, _state) = spawn_app_with_key(INTERNAL_KEY).await;

    let conflict = |answers: serde_json::Value| {
        let payload = serde_json::json!({
            "village_id": 1,
            "question": "Jam buka kantor desa?",
            "answers": answers,
        });
        Request::builder()
            .method("POST")
            .uri("/api/internal/knowledge/conflicts")
            .header("content-type", "application/json")
            .header("x-internal-api-key", INTERNAL_KEY)
            .body(Body::from(payload.to_string()))
            .unwrap()
    };

    // A single answer is not a conflict.
    let response = app
        .clone()
        .oneshot(conflict(serde_json::json!(["08.00-16.00"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(conflict(serde_json::json!(["08.00-16.00", "09.00-15.00"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await;
    assert_eq!(first["data"]["hit_count"], 1);

    let response = app
        .oneshot(conflict(serde_json::json!(["08.00-16.00", "08.30-15.30"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = body_json(response).await;
    assert_eq!(second["data"]["id"], first["data"]["id"]);
    assert_eq!(second["data"]["hit_count"], 2);
}
