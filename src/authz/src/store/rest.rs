//! PostgREST-backed user store
//!
//! Talks to a hosted Postgres exposed through a PostgREST gateway, the way
//! the user table was reached before this service existed:
//!
//! ```text
//! GET {url}/rest/v1/{table}?id=eq.{id}&select=id,username,email,role,created_at
//! apikey: {api_key}
//! Authorization: Bearer {api_key}
//! ```
//!
//! Timeouts are owned by the HTTP client configured here; the decision
//! engine adds none of its own.

use super::{LookupResult, UserRoleLookup};
use crate::error::{AuthzError, LookupFault, Result};
use crate::types::{RoleRecord, UserRecord};
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Columns requested for every lookup
pub const SELECT_COLUMNS: &str = "id,username,email,role,created_at";

/// REST store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestStoreConfig {
    /// Base project URL (e.g. "https://project.example.co")
    pub url: String,

    /// Service API key sent as `apikey` and bearer token
    pub api_key: String,

    /// Table holding user rows
    pub table: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl RestStoreConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            table: "users".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(AuthzError::Config("store url is not configured".to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(AuthzError::Config("store api key is not configured".to_string()));
        }
        if self.table.trim().is_empty() {
            return Err(AuthzError::Config("store table cannot be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(AuthzError::Config("store timeout must be positive".to_string()));
        }
        Ok(())
    }
}

/// User store reached over HTTP
#[derive(Debug, Clone)]
pub struct RestUserStore {
    client: reqwest::Client,
    config: RestStoreConfig,
}

impl RestUserStore {
    /// Build a store client
    ///
    /// # Errors
    ///
    /// [`AuthzError::Config`] when the URL or key is missing, or the HTTP
    /// client cannot be constructed.
    pub fn new(config: RestStoreConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthzError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RestStoreConfig {
        &self.config
    }

    fn users_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.url.trim_end_matches('/'),
            self.config.table
        )
    }

    /// Fetch the full user row with primary key `id`
    pub async fn fetch_user(&self, id: &str) -> std::result::Result<UserRecord, LookupFault> {
        self.fetch_single(id).await
    }

    /// Fetch the row with primary key `id`, decoding only the fields of `T`
    ///
    /// Columns `T` does not declare are skipped without being parsed.
    async fn fetch_single<T: DeserializeOwned>(
        &self,
        id: &str,
    ) -> std::result::Result<T, LookupFault> {
        let response = self
            .client
            .get(self.users_url())
            .query(&[("id", format!("eq.{}", id)), ("select", SELECT_COLUMNS.to_string())])
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(fault_from_reqwest)?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(LookupFault::NotFound),
            status => {
                return Err(LookupFault::Transport(format!(
                    "unexpected status {}",
                    status
                )))
            }
        }

        let body = response.bytes().await.map_err(fault_from_reqwest)?;
        let mut rows: Vec<T> = serde_json::from_slice(&body)
            .map_err(|e| LookupFault::Malformed(e.to_string()))?;

        debug!(rows = rows.len(), "User store answered");

        match rows.len() {
            0 => Err(LookupFault::NotFound),
            1 => Ok(rows.remove(0)),
            n => Err(LookupFault::Malformed(format!(
                "expected a single row, got {}",
                n
            ))),
        }
    }
}

#[async_trait]
impl UserRoleLookup for RestUserStore {
    async fn lookup_role_by_id(&self, id: &str) -> LookupResult {
        // only the role column is decoded; id and created_at types vary by schema
        self.fetch_single::<RoleRecord>(id).await
    }
}

fn fault_from_reqwest(err: reqwest::Error) -> LookupFault {
    if err.is_timeout() {
        LookupFault::Timeout
    } else if err.is_decode() {
        LookupFault::Malformed(err.to_string())
    } else {
        LookupFault::Transport(err.to_string())
    }
}
