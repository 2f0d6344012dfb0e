//! PostgREST user store against an in-process fake gateway

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rolegate_authz::{
    error::{AuthzError, LookupFault},
    store::{RestStoreConfig, RestUserStore, UserRoleLookup},
    AuthorizationEngine, PolicyRegistry, Principal, Role,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const API_KEY: &str = "service-key";

async fn users(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let authorized = headers.get("apikey").and_then(|v| v.to_str().ok()) == Some(API_KEY)
        && headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer service-key");
    if !authorized {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid API key"})));
    }

    if params.get("select").map(String::as_str) != Some("id,username,email,role,created_at") {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "bad select"})));
    }

    let rows = match params.get("id").map(String::as_str) {
        Some("eq.editor") => json!([{
            "id": "editor",
            "username": "ed",
            "email": "ed@example.com",
            "role": "Editor",
            "created_at": "2024-03-01T08:30:00Z"
        }]),
        Some("eq.7") => json!([{
            "id": 7,
            "username": "numeric",
            "email": null,
            "role": "Admin",
            "created_at": "2024-03-01T08:30:00Z"
        }]),
        Some("eq.naive") => json!([{
            "id": "naive",
            "username": "local-time",
            "email": null,
            "role": "Admin",
            "created_at": "2024-03-01T08:30:00.123456"
        }]),
        Some("eq.no-role") => json!([{"id": "no-role", "username": "nr", "email": null, "role": null}]),
        Some("eq.twins") => json!([{"id": "twins", "role": "Admin"}, {"id": "twins", "role": "Viewer"}]),
        Some("eq.garbage") => json!({"unexpected": "object"}),
        Some("eq.broken") => {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"message": "db down"})))
        }
        _ => json!([]),
    };

    (StatusCode::OK, Json(rows))
}

async fn slow_users() -> impl IntoResponse {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!([{"id": "editor", "role": "Editor"}]))
}

async fn spawn_gateway() -> String {
    let router = Router::new()
        .route("/rest/v1/users", get(users))
        .route("/rest/v1/slow", get(slow_users));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

fn store(url: &str) -> RestUserStore {
    RestUserStore::new(RestStoreConfig::new(url, API_KEY)).unwrap()
}

#[tokio::test]
async fn test_lookup_returns_role() {
    let url = spawn_gateway().await;
    let store = store(&url);

    let user = store.fetch_user("editor").await.unwrap();
    assert_eq!(user.username.as_deref(), Some("ed"));
    assert!(user.created_at.is_some());

    let record = store.lookup_role_by_id("editor").await.unwrap();
    assert_eq!(record.role_name(), Some("Editor"));
}

#[tokio::test]
async fn test_role_lookup_ignores_other_column_types() {
    let url = spawn_gateway().await;
    let store = store(&url);

    // numeric primary key
    let record = store.lookup_role_by_id("7").await.unwrap();
    assert_eq!(record.role_name(), Some("Admin"));

    // timestamp column without a zone offset
    let record = store.lookup_role_by_id("naive").await.unwrap();
    assert_eq!(record.role_name(), Some("Admin"));
}

#[tokio::test]
async fn test_admin_with_naive_timestamp_is_granted() {
    let url = spawn_gateway().await;
    let registry = Arc::new(PolicyRegistry::builder().build().unwrap());
    let engine = AuthorizationEngine::new(Arc::new(store(&url)), registry);

    for id in ["7", "naive"] {
        let decision = engine.check(Some(&Principal::new(id)), Role::Viewer).await;
        assert!(decision.is_succeeded(), "principal {}", id);
    }
}

#[tokio::test]
async fn test_null_role_is_not_a_fault() {
    let url = spawn_gateway().await;
    let record = store(&url).lookup_role_by_id("no-role").await.unwrap();
    assert_eq!(record.role_name(), None);
}

#[tokio::test]
async fn test_zero_rows_is_not_found() {
    let url = spawn_gateway().await;
    assert_eq!(
        store(&url).lookup_role_by_id("nobody").await,
        Err(LookupFault::NotFound)
    );
}

#[tokio::test]
async fn test_multiple_rows_is_malformed() {
    let url = spawn_gateway().await;
    let result = store(&url).lookup_role_by_id("twins").await;
    assert!(matches!(result, Err(LookupFault::Malformed(_))));
}

#[tokio::test]
async fn test_non_array_body_is_malformed() {
    let url = spawn_gateway().await;
    let result = store(&url).lookup_role_by_id("garbage").await;
    assert!(matches!(result, Err(LookupFault::Malformed(_))));
}

#[tokio::test]
async fn test_server_error_is_transport_fault() {
    let url = spawn_gateway().await;
    let result = store(&url).lookup_role_by_id("broken").await;
    assert!(matches!(result, Err(LookupFault::Transport(_))));
}

#[tokio::test]
async fn test_wrong_key_is_transport_fault() {
    let url = spawn_gateway().await;
    let store = RestUserStore::new(RestStoreConfig::new(&url, "wrong")).unwrap();
    let result = store.lookup_role_by_id("editor").await;
    assert!(matches!(result, Err(LookupFault::Transport(_))));
}

#[tokio::test]
async fn test_client_timeout_is_timeout_fault() {
    let url = spawn_gateway().await;
    let store = RestUserStore::new(
        RestStoreConfig::new(&url, API_KEY)
            .with_table("slow")
            .with_timeout(Duration::from_millis(100)),
    )
    .unwrap();

    assert_eq!(
        store.lookup_role_by_id("editor").await,
        Err(LookupFault::Timeout)
    );
}

#[tokio::test]
async fn test_unreachable_store_is_transport_fault() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = store(&format!("http://{}", addr))
        .lookup_role_by_id("editor")
        .await;
    assert!(matches!(result, Err(LookupFault::Transport(_))));
}

#[tokio::test]
async fn test_missing_configuration_rejected() {
    let err = RestUserStore::new(RestStoreConfig::new("", API_KEY)).unwrap_err();
    assert!(matches!(err, AuthzError::Config(_)));
}

#[tokio::test]
async fn test_engine_over_rest_store() {
    let url = spawn_gateway().await;
    let registry = Arc::new(PolicyRegistry::builder().build().unwrap());
    let engine = AuthorizationEngine::new(Arc::new(store(&url)), registry);

    let editor = Principal::new("editor");
    assert!(engine.check(Some(&editor), Role::Editor).await.is_succeeded());
    assert!(engine.check(Some(&editor), Role::Admin).await.is_failed());
    assert!(engine
        .check(Some(&Principal::new("broken")), Role::Viewer)
        .await
        .is_failed());
    assert!(engine
        .check(Some(&Principal::new("no-role")), Role::Viewer)
        .await
        .is_failed());

    let metrics = engine.get_metrics().unwrap();
    assert_eq!(metrics.succeeded, 1);
    assert_eq!(metrics.lookup_faults, 1);
    assert_eq!(metrics.missing_role, 1);
    assert_eq!(metrics.insufficient_rank, 1);
}
