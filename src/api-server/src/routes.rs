//! Route definitions for the API server
//!
//! This module configures all HTTP routes with OpenAPI documentation.
//! Routes are organized by functionality:
//! - Health and metrics endpoints (unprotected)
//! - Protected resource operations, each behind a role guard
//! - OpenAPI document

use crate::{
    handlers,
    middleware::{self, RoleGuard},
    server::ServerConfig,
    state::AppState,
};
use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put, MethodRouter},
    Json, Router,
};
use rolegate_authz::{AuthzError, OperationBinding, PolicyRegistry};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;

/// A protected operation and the role it requires out of the box
#[derive(Debug, Clone, Copy)]
pub struct ProtectedOperation {
    pub id: &'static str,
    pub path: &'static str,
    pub required_role: &'static str,
}

/// Every protected operation served by this crate
pub const PROTECTED_OPERATIONS: [ProtectedOperation; 4] = [
    ProtectedOperation {
        id: "viewer-content",
        path: "/api/resource/viewer-content",
        required_role: "Viewer",
    },
    ProtectedOperation {
        id: "editor-action",
        path: "/api/resource/editor-action",
        required_role: "Editor",
    },
    ProtectedOperation {
        id: "admin-update",
        path: "/api/resource/admin-update",
        required_role: "Admin",
    },
    ProtectedOperation {
        id: "super-admin-delete",
        path: "/api/resource/super-admin-delete",
        required_role: "SuperAdmin",
    },
];

/// OpenAPI documentation configuration
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rolegate API",
        description = "Role-gated resource operations"
    ),
    paths(
        handlers::health_check,
        handlers::metrics,
        handlers::viewer_content,
        handlers::editor_action,
        handlers::admin_update,
        handlers::super_admin_delete,
    ),
    components(
        schemas(
            crate::models::HealthResponse,
            crate::models::MessageResponse,
            crate::models::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health and monitoring endpoints"),
        (name = "resource", description = "Role-protected operations"),
    )
)]
pub struct ApiDoc;

/// Policy registry with the built-in bindings and configured overrides
///
/// # Errors
///
/// Fails when an override names an unknown role or an operation this crate
/// does not serve.
pub fn build_registry(overrides: &[OperationBinding]) -> Result<PolicyRegistry, AuthzError> {
    let mut builder = PolicyRegistry::builder();
    for operation in PROTECTED_OPERATIONS {
        builder = builder.bind(operation.id, operation.required_role);
    }
    for binding in overrides {
        builder = builder.rebind(binding.operation.clone(), binding.required_role.clone());
    }
    builder.build()
}

/// Serve the OpenAPI document
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn protected(
    state: &AppState,
    operation: &'static str,
    method_router: MethodRouter<AppState>,
) -> Result<MethodRouter<AppState>, AuthzError> {
    let requirement = state.engine.registry().require(operation)?;
    let guard = RoleGuard::new(state.engine.clone(), operation, requirement);

    Ok(method_router.route_layer(axum_middleware::from_fn_with_state(
        guard,
        middleware::authorize,
    )))
}

/// Create the application router with all routes and middleware
///
/// Every protected operation must be bound in the engine's registry;
/// a missing binding is reported instead of serving the route unguarded.
pub fn create_router(state: AppState, config: &ServerConfig) -> Result<Router, AuthzError> {
    let [viewer, editor, admin, super_admin] = PROTECTED_OPERATIONS;

    let router = Router::new()
        // Health and metrics (no principal required)
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics))
        // OpenAPI documentation
        .route("/api-docs", get(openapi_json))
        .route("/api-docs/openapi.json", get(openapi_json))
        // Protected operations
        .route(
            viewer.path,
            protected(&state, viewer.id, get(handlers::viewer_content))?,
        )
        .route(
            editor.path,
            protected(&state, editor.id, post(handlers::editor_action))?,
        )
        .route(
            admin.path,
            protected(&state, admin.id, put(handlers::admin_update))?,
        )
        .route(
            super_admin.path,
            protected(&state, super_admin.id, delete(handlers::super_admin_delete))?,
        )
        .fallback(handlers::not_found)
        .with_state(state)
        // Middleware layers (executed bottom to top)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
