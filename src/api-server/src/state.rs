use crate::config::{ServiceConfig, StoreBackend};
use crate::routes;
use anyhow::{Context, Result};
use rolegate_authz::{AuthorizationEngine, RestUserStore, UserRoleLookup};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Authorization decision engine
    pub engine: Arc<AuthorizationEngine>,

    /// Server start time for uptime calculation
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

impl AppState {
    pub fn new(engine: AuthorizationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Assemble registry, user store and engine from a validated configuration
    ///
    /// Fails on an invalid operation binding or an unusable store setup.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let registry =
            routes::build_registry(&config.bindings).context("Invalid operation bindings")?;

        let lookup: Arc<dyn UserRoleLookup> = match config.store.backend {
            StoreBackend::Rest => {
                let store = RestUserStore::new(config.rest_store_config()?)
                    .context("Failed to create user store client")?;
                info!(table = %config.store.table, "Using REST user store");
                Arc::new(store)
            }
            StoreBackend::Memory => {
                let store = config.seeded_memory_store();
                info!(users = store.len(), "Using in-memory user store");
                Arc::new(store)
            }
        };

        Ok(Self::new(AuthorizationEngine::new(lookup, Arc::new(registry))))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
