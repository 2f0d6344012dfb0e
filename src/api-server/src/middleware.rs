//! Middleware layer for the API server
//!
//! This module provides middleware components for:
//! - Principal extraction and role checks on protected operations
//! - Request logging and tracing
//! - CORS configuration
//! - Request ID tracking

use crate::error::{ApiError, Result};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method},
    middleware::Next,
    response::Response,
};
use rolegate_authz::{AuthorizationEngine, AuthorizationRequirement, Principal};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Request ID header name
pub const X_REQUEST_ID: &str = "x-request-id";

/// Header carrying the subject verified by the upstream identity layer
pub const X_PRINCIPAL_ID: &str = "x-principal-id";

/// Configure CORS middleware
///
/// An empty origin list allows any origin without credentials; otherwise only
/// the listed origins are allowed and credentials are permitted.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::HeaderName::from_static(X_REQUEST_ID),
            header::HeaderName::from_static(X_PRINCIPAL_ID),
        ])
        .expose_headers([header::HeaderName::from_static(X_REQUEST_ID)])
        .max_age(std::time::Duration::from_secs(3600));

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(allowed).allow_credentials(true)
}

/// Principal forwarded by the identity layer, if any
///
/// A missing, non-UTF-8 or blank header yields no principal.
pub fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    headers
        .get(X_PRINCIPAL_ID)
        .and_then(|v| v.to_str().ok())
        .map(Principal::new)
        .filter(Principal::has_id)
}

/// Requirement guarding one protected operation
#[derive(Clone)]
pub struct RoleGuard {
    engine: Arc<AuthorizationEngine>,
    operation: &'static str,
    requirement: AuthorizationRequirement,
}

impl RoleGuard {
    pub fn new(
        engine: Arc<AuthorizationEngine>,
        operation: &'static str,
        requirement: AuthorizationRequirement,
    ) -> Self {
        Self {
            engine,
            operation,
            requirement,
        }
    }
}

/// Role check middleware
///
/// Runs the decision engine before the handler. A failed decision returns
/// 403 and the handler never runs; dropping this future (client disconnect,
/// request timeout) abandons the in-flight role lookup.
pub async fn authorize(
    State(guard): State<RoleGuard>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let request_id = request
        .extensions()
        .get::<Uuid>()
        .copied()
        .unwrap_or_else(Uuid::new_v4);

    let principal = principal_from_headers(request.headers());
    let decision = guard
        .engine
        .evaluate(principal.as_ref(), &guard.requirement)
        .await;

    if decision.is_failed() {
        debug!(
            request_id = %request_id,
            operation = guard.operation,
            required_role = %guard.requirement.required_role,
            "Access denied"
        );
        return Err(ApiError::AccessDenied);
    }

    Ok(next.run(request).await)
}

/// Request ID middleware
///
/// Generates or extracts a unique request ID for tracking requests through
/// the system. The request ID is added to all log messages and returned in
/// the response headers.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }

    response
}

/// Request logging middleware
///
/// Logs all incoming requests with method, URI, and response status.
/// Includes request ID for correlation.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<Uuid>()
        .copied()
        .unwrap_or_else(Uuid::new_v4);

    info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Incoming request"
    );

    let start = std::time::Instant::now();
    let response = next.run(request).await;
    let elapsed = start.elapsed();

    let status = response.status();
    if status.is_server_error() {
        error!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Request failed"
        );
    } else {
        info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            duration_ms = elapsed.as_millis() as u64,
            "Request completed"
        );
    }

    response
}
