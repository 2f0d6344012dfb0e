//! HTTP service hosting the role-gated resource operations
//!
//! Wraps the `rolegate-authz` decision engine in an axum router: each
//! protected route runs a role guard before its handler, and a failed
//! decision is answered with 403.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ConfigOverrides, ServiceConfig};
pub use error::{ApiError, Result};
pub use server::{Server, ServerBuilder, ServerConfig};
pub use state::AppState;
