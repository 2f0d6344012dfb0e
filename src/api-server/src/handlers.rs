use axum::{
    extract::State,
    http::{header, Uri},
    response::IntoResponse,
    Json,
};

use crate::{
    error::ApiError,
    models::{ErrorResponse, HealthResponse, MessageResponse},
    state::AppState,
};

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Get metrics (Prometheus format)
#[utoipa::path(
    get,
    path = "/metrics",
    responses(
        (status = 200, description = "Prometheus metrics", body = String)
    ),
    tag = "health"
)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let mut body = state.engine.export_metrics().unwrap_or_default();
    body.push_str("# HELP rbac_uptime_seconds Seconds since the server started\n");
    body.push_str("# TYPE rbac_uptime_seconds gauge\n");
    body.push_str(&format!("rbac_uptime_seconds {}\n", state.uptime_seconds()));

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

/// Content readable by every authenticated role
#[utoipa::path(
    get,
    path = "/api/resource/viewer-content",
    params(
        ("x-principal-id" = String, Header, description = "Verified subject identifier")
    ),
    responses(
        (status = 200, description = "Access granted", body = MessageResponse),
        (status = 403, description = "Access denied", body = ErrorResponse)
    ),
    tag = "resource"
)]
pub async fn viewer_content() -> Json<MessageResponse> {
    Json(MessageResponse::new("Content for all authenticated users"))
}

/// Action requiring at least Editor
#[utoipa::path(
    post,
    path = "/api/resource/editor-action",
    params(
        ("x-principal-id" = String, Header, description = "Verified subject identifier")
    ),
    responses(
        (status = 200, description = "Access granted", body = MessageResponse),
        (status = 403, description = "Access denied", body = ErrorResponse)
    ),
    tag = "resource"
)]
pub async fn editor_action() -> Json<MessageResponse> {
    Json(MessageResponse::new("Editor action performed"))
}

/// Update requiring at least Admin
#[utoipa::path(
    put,
    path = "/api/resource/admin-update",
    params(
        ("x-principal-id" = String, Header, description = "Verified subject identifier")
    ),
    responses(
        (status = 200, description = "Access granted", body = MessageResponse),
        (status = 403, description = "Access denied", body = ErrorResponse)
    ),
    tag = "resource"
)]
pub async fn admin_update() -> Json<MessageResponse> {
    Json(MessageResponse::new("Admin update performed"))
}

/// Delete reserved to SuperAdmin
#[utoipa::path(
    delete,
    path = "/api/resource/super-admin-delete",
    params(
        ("x-principal-id" = String, Header, description = "Verified subject identifier")
    ),
    responses(
        (status = 200, description = "Access granted", body = MessageResponse),
        (status = 403, description = "Access denied", body = ErrorResponse)
    ),
    tag = "resource"
)]
pub async fn super_admin_delete() -> Json<MessageResponse> {
    Json(MessageResponse::new("Super Admin delete performed"))
}

/// Fallback for unknown paths
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}
