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

const BOOTSTRAP_USERNAME: &str = "superadmin";
const BOOTSTRAP_PASSWORD: &str = "password";

async fn spawn_app() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

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

async fn superadmin_token(app: &Router) -> String {
    let payload = serde_json::json!({
        "username": BOOTSTRAP_USERNAME,
        "password": BOOTSTRAP_PASSWORD,
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    json["token"].as_str().unwrap().to_string()
}

fn register_request(token: Option<&str>, payload: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

fn village_payload(slug: &str, username: &str) -> serde_json::Value {
    serde_json::json!({
        "username": username,
        "password": "budisecret123",
        "name": "Pak Budi",
        "village_name": "Desa Sukamaju",
        "village_slug": slug,
        "short_name": "Sukamaju",
    })
}

#[tokio::test]
async fn test_register_without_token_is_403_and_writes_nothing() {
    let (app, state) = spawn_app().await;

    let response = app
        .oneshot(register_request(None, &village_payload("sukamaju", "budi")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert_eq!(state.store().village_count().await.unwrap(), 0);
    assert!(
        state
            .store()
            .get_admin_by_username("budi")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_register_with_bogus_token_is_403() {
    let (app, _state) = spawn_app().await;

    let response = app
        .oneshot(register_request(
            Some("not-a-token"),
            &village_payload("sukamaju", "budi"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_superadmin_registers_village() {
    let (app, state) = spawn_app().await;
    let token = superadmin_token(&app).await;

    let response = app
        .clone()
        .oneshot(register_request(
            Some(&token),
            &village_payload("sukamaju", "budi"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["village"]["slug"], "sukamaju");
    assert_eq!(json["user"]["username"], "budi");
    assert_eq!(json["user"]["role"], "village_admin");

    // Default knowledge categories come with the village.
    let village_id = json["village"]["id"].as_i64().unwrap() as i32;
    let categories = state.store().list_categories(village_id).await.unwrap();
    assert_eq!(categories.len(), 4);

    // The returned token belongs to the new admin and works right away.
    let new_admin_token = json["token"].as_str().unwrap();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("authorization", format!("Bearer {new_admin_token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let me = body_json(response).await;
    assert_eq!(me["data"]["username"], "budi");
}

#[tokio::test]
async fn test_register_whitespace_username_is_400() {
    let (app, state) = spawn_app().await;
    let token = superadmin_token(&app).await;

    // Blank-only and embedded whitespace both fail validation up front.
    for username in ["   ", "pak budi", "budi\ttanoto"] {
        let response = app
            .clone()
            .oneshot(register_request(
                Some(&token),
                &village_payload("sukamaju", username),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // Nothing partial left behind before the village insert.
    assert!(
        state
            .store()
            .get_village_by_slug("sukamaju")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        state
            .store()
            .get_admin_by_username("pak budi")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_register_duplicate_slug_is_409() {
    let (app, _state) = spawn_app().await;
    let token = superadmin_token(&app).await;

    let response = app
        .clone()
        .oneshot(register_request(
            Some(&token),
            &village_payload("sukamaju", "budi"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(register_request(
            Some(&token),
            &village_payload("sukamaju", "siti"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_duplicate_admin_username_is_409() {
    let (app, _state) = spawn_app().await;
    let token = superadmin_token(&app).await;

    let response = app
        .clone()
        .oneshot(register_request(
            Some(&token),
            &village_payload("sukamaju", "budi"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Fresh slug, taken username. The unique index fires on the admin
    // insert and must surface as a conflict, not a server error.
    let response = app
        .oneshot(register_request(
            Some(&token),
            &village_payload("makmur", "budi"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_village_admin_cannot_register() {
    let (app, _state) = spawn_app().await;
    let token = superadmin_token(&app).await;

    let response = app
        .clone()
        .oneshot(register_request(
            Some(&token),
            &village_payload("sukamaju", "budi"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let village_admin_token = json["token"].as_str().unwrap().to_string();

    let response = app
        .oneshot(register_request(
            Some(&village_admin_token),
            &village_payload("makmur", "siti"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_role_matrix_on_protected_routes() {
    let (app, _state) = spawn_app().await;
    let superadmin = superadmin_token(&app).await;

    let response = app
        .clone()
        .oneshot(register_request(
            Some(&superadmin),
            &village_payload("sukamaju", "budi"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let village_admin = body_json(response).await["token"]
        .as_str()
        .unwrap()
        .to_string();

    let get = |uri: &str, token: &str| {
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    // Village roster is superadmin territory.
    let response = app
        .clone()
        .oneshot(get("/api/villages", &superadmin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/api/villages", &village_admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Categories belong to village dashboards; a superadmin has no village.
    let response = app
        .clone()
        .oneshot(get("/api/categories", &village_admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let categories = body_json(response).await;
    assert_eq!(categories["data"].as_array().unwrap().len(), 4);

    let response = app
        .oneshot(get("/api/categories", &superadmin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_tenant_isolation_between_villages() {
    let (app, state) = spawn_app().await;
    let superadmin = superadmin_token(&app).await;

    let first = app
        .clone()
        .oneshot(register_request(
            Some(&superadmin),
            &village_payload("sukamaju", "budi"),
        ))
        .await
        .unwrap();
    let first = body_json(first).await;

    let second = app
        .clone()
        .oneshot(register_request(
            Some(&superadmin),
            &village_payload("makmur", "siti"),
        ))
        .await
        .unwrap();
    let second = body_json(second).await;

    let first_village = first["village"]["id"].as_i64().unwrap() as i32;
    let second_village = second["village"]["id"].as_i64().unwrap() as i32;
    assert_ne!(first_village, second_village);

    // Each admin only ever sees their own village's categories.
    let budi = state
        .store()
        .get_admin_by_username("budi")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(budi.village_id, Some(first_village));

    let siti = state
        .store()
        .get_admin_by_username("siti")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(siti.village_id, Some(second_village));
}
