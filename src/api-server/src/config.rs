//! Service configuration loading and validation
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags / environment variables.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! cors_origins = ["https://localhost:7015"]
//!
//! [store]
//! backend = "rest"
//! url = "https://project.example.co"
//! api_key = "service-key"
//!
//! [[bindings]]
//! operation = "editor-action"
//! required_role = "Admin"
//! ```

use anyhow::{Context, Result};
use rolegate_authz::{InMemoryUserStore, OperationBinding, RestStoreConfig, UserRecord};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete service configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub store: StoreSection,

    /// Overrides of the built-in operation bindings
    #[serde(default)]
    pub bindings: Vec<OperationBinding>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Which user store backs role lookups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Rest,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_store_timeout")]
    pub timeout_ms: u64,

    /// Seed users for the memory backend
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: None,
            api_key: None,
            table: default_table(),
            timeout_ms: default_store_timeout(),
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedUser {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Values supplied on the command line or via environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub store_url: Option<String>,
    pub store_api_key: Option<String>,
    pub store_timeout_ms: Option<u64>,
}

// Default value functions
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }
fn default_request_timeout() -> u64 { 30 }
fn default_table() -> String { "users".to_string() }
fn default_store_timeout() -> u64 { 5000 }

impl ServiceConfig {
    /// Load configuration from TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).with_context(|| {
            format!(
                "Failed to read configuration file {}",
                path.as_ref().display()
            )
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Failed to parse configuration file")
    }

    /// Apply command-line / environment overrides on top of file values
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(url) = overrides.store_url {
            self.store.url = Some(url);
        }
        if let Some(api_key) = overrides.store_api_key {
            self.store.api_key = Some(api_key);
        }
        if let Some(timeout_ms) = overrides.store_timeout_ms {
            self.store.timeout_ms = timeout_ms;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("server.request_timeout_secs must be positive");
        }

        if self.store.backend == StoreBackend::Rest {
            let configured = |value: &Option<String>| {
                value.as_deref().map_or(false, |v| !v.trim().is_empty())
            };
            if !configured(&self.store.url) || !configured(&self.store.api_key) {
                anyhow::bail!("User store url and api key must be configured for the rest backend");
            }
            if self.store.timeout_ms == 0 {
                anyhow::bail!("store.timeout_ms must be positive");
            }
        }

        if self.store.users.iter().any(|user| user.id.trim().is_empty()) {
            anyhow::bail!("Seed users must have a non-empty id");
        }

        Ok(())
    }

    /// Connection settings for the REST store
    pub fn rest_store_config(&self) -> Result<RestStoreConfig> {
        let url = self
            .store
            .url
            .clone()
            .context("store.url is not configured")?;
        let api_key = self
            .store
            .api_key
            .clone()
            .context("store.api_key is not configured")?;

        Ok(RestStoreConfig::new(url, api_key)
            .with_table(self.store.table.clone())
            .with_timeout(Duration::from_millis(self.store.timeout_ms)))
    }

    /// In-memory store populated from the seed list
    pub fn seeded_memory_store(&self) -> InMemoryUserStore {
        let store = InMemoryUserStore::new();
        for seed in &self.store.users {
            store.insert(UserRecord {
                id: Some(seed.id.clone()),
                username: seed.username.clone(),
                email: seed.email.clone(),
                role: seed.role.clone(),
                created_at: None,
            });
        }
        store
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}
