//! # Rolegate Authorization Layer
//!
//! Hierarchical role-based access control for protected operations.
//!
//! ## Components
//!
//! - **Role hierarchy** ([`role`]): the closed set `Viewer < Editor < Admin < SuperAdmin`
//!   and the [`rank`] function that orders it
//! - **Policy registry** ([`policy`]): one `RequireRole<Name>` policy per role and the
//!   bindings from protected operations to them, validated once at startup
//! - **Decision engine** ([`engine`]): fetches the principal's current role from the
//!   user store and compares ranks, failing closed on any store fault
//! - **User stores** ([`store`]): the lookup capability plus in-memory and
//!   PostgREST implementations
//!
//! ## Example
//!
//! ```rust
//! use rolegate_authz::{
//!     AuthorizationEngine, InMemoryUserStore, PolicyRegistry, Principal, Role, UserRecord,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = PolicyRegistry::builder()
//!         .bind("editor-action", "Editor")
//!         .build()?;
//!
//!     let store = InMemoryUserStore::new();
//!     store.insert(UserRecord::new("user-1", "Admin"));
//!
//!     let engine = AuthorizationEngine::new(Arc::new(store), Arc::new(registry));
//!
//!     let principal = Principal::new("user-1");
//!     let decision = engine.check(Some(&principal), Role::Editor).await;
//!
//!     if decision.is_succeeded() {
//!         println!("Access granted!");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;
pub mod policy;
pub mod role;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use engine::{AuthorizationDecision, AuthorizationEngine, EngineConfig, EngineMetrics};
pub use error::{AuthzError, LookupFault, Result};
pub use policy::{policy_key, AuthorizationRequirement, OperationBinding, PolicyRegistry};
pub use role::{rank, Role};
pub use store::{InMemoryUserStore, RestStoreConfig, RestUserStore, UserRoleLookup};
pub use types::{Principal, RoleRecord, UserRecord};
