//! Core authorization types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated caller for one request
///
/// Produced by the identity layer in front of this crate; the identifier is
/// opaque and only meaningful to the user store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Stable subject identifier
    pub id: String,
}

impl Principal {
    /// Create a principal from its identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Whether the identifier carries anything to look up
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }
}

/// User row as persisted by the external store
///
/// Every column is nullable on the store side; only `role` is read by the
/// decision engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Minimal record with an id and a role name
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            username: None,
            email: None,
            role: Some(role.into()),
            created_at: Some(Utc::now()),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Projection handed to the decision engine
    pub fn role_record(&self) -> RoleRecord {
        RoleRecord {
            role: self.role.clone(),
        }
    }
}

/// The part of a user record the engine consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    #[serde(default)]
    pub role: Option<String>,
}

impl RoleRecord {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: Some(role.into()),
        }
    }

    /// Role name if present and non-empty
    pub fn role_name(&self) -> Option<&str> {
        self.role.as_deref().filter(|role| !role.is_empty())
    }
}
