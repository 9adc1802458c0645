use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use todo_api::comms::local_api::{create_router, AppState};
use todo_api::config::Config;
use todo_api::security::KeyStore;
use todo_api::todos::MemoryTodoRepository;
use tower::ServiceExt;

// Helper to create router from a config file, the way the binary does
fn test_router() -> Router {
    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");
    let raw = format!(
        r#"{{
            "port": 8080,
            "server_timeout": 5,
            "token": {{"expire": 60, "issuer": "todo-api"}},
            "server": {{"public_key": "{dir}/server_public.pem", "private_key": "{dir}/server_private.pem"}},
            "client": {{"key": "K1", "secret": "S1", "public_key": "{dir}/client_public.pem"}}
        }}"#
    );
    let config = Config::from_json(&raw).unwrap();
    let keys = KeyStore::load(&config).unwrap();
    let state = AppState::new(Arc::new(config), keys, Arc::new(MemoryTodoRepository::new()));
    create_router(Arc::new(state))
}

#[tokio::test]
async fn test_halo_endpoint() {
    let app = test_router();

    let response = app
        .oneshot(Request::builder().uri("/halo").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["responseCode"], "00");
    assert_eq!(body["responseMessage"], "Halo");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/halo")
                .header("X-Request-ID", "req-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-123");
}

#[tokio::test]
async fn test_request_id_generated_on_errors() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1.0/access-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let id = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/v1.0/access-token")
                .header("Origin", "https://client.example")
                .header("Access-Control-Request-Method", "POST")
                .header("Access-Control-Request-Headers", "x-signature")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/v1.0/access-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
