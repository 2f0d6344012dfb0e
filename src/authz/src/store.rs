//! User role lookup
//!
//! The single capability the decision engine consumes from the outside
//! world. Implementations report failures as a [`LookupFault`]; they never
//! decide anything themselves.

use crate::error::LookupFault;
use crate::types::{RoleRecord, UserRecord};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

pub mod rest;

pub use rest::{RestStoreConfig, RestUserStore};

/// Outcome of one user-role lookup
pub type LookupResult = std::result::Result<RoleRecord, LookupFault>;

/// Single-record lookup of a user's current role by stable identifier
#[async_trait]
pub trait UserRoleLookup: Send + Sync {
    /// Fetch the role of the user with primary key `id`
    async fn lookup_role_by_id(&self, id: &str) -> LookupResult;
}

#[async_trait]
impl<T: UserRoleLookup + ?Sized> UserRoleLookup for Arc<T> {
    async fn lookup_role_by_id(&self, id: &str) -> LookupResult {
        (**self).lookup_role_by_id(id).await
    }
}

/// In-memory user store
///
/// Backed by a `DashMap`, so writers (role changes) and concurrent lookups
/// never block each other for long. A role change is visible to the very
/// next lookup.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<DashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user record keyed by its id
    ///
    /// Records without an id are ignored.
    pub fn insert(&self, record: UserRecord) {
        if let Some(id) = record.id.clone() {
            self.users.insert(id, record);
        }
    }

    /// Change the role of an existing user; returns false if unknown
    pub fn set_role(&self, id: &str, role: Option<&str>) -> bool {
        match self.users.get_mut(id) {
            Some(mut record) => {
                record.role = role.map(str::to_string);
                true
            }
            None => false,
        }
    }

    /// Remove a user, returning the stored record
    pub fn remove(&self, id: &str) -> Option<UserRecord> {
        self.users.remove(id).map(|(_, record)| record)
    }

    /// Full record for an id
    pub fn get(&self, id: &str) -> Option<UserRecord> {
        self.users.get(id).map(|record| record.clone())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserRoleLookup for InMemoryUserStore {
    async fn lookup_role_by_id(&self, id: &str) -> LookupResult {
        self.users
            .get(id)
            .map(|record| record.role_record())
            .ok_or(LookupFault::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_existing_user() {
        let store = InMemoryUserStore::new();
        store.insert(UserRecord::new("u-1", "Editor").with_username("alice"));

        let record = store.lookup_role_by_id("u-1").await.unwrap();
        assert_eq!(record.role_name(), Some("Editor"));
    }

    #[tokio::test]
    async fn test_lookup_missing_user() {
        let store = InMemoryUserStore::new();
        assert_eq!(
            store.lookup_role_by_id("ghost").await,
            Err(LookupFault::NotFound)
        );
    }

    #[tokio::test]
    async fn test_set_role_visible_immediately() {
        let store = InMemoryUserStore::new();
        store.insert(UserRecord::new("u-1", "Viewer"));

        assert!(store.set_role("u-1", Some("Admin")));
        let record = store.lookup_role_by_id("u-1").await.unwrap();
        assert_eq!(record.role_name(), Some("Admin"));

        assert!(store.set_role("u-1", None));
        let record = store.lookup_role_by_id("u-1").await.unwrap();
        assert_eq!(record.role_name(), None);

        assert!(!store.set_role("ghost", Some("Admin")));
    }

    #[tokio::test]
    async fn test_remove_and_record_without_id() {
        let store = InMemoryUserStore::new();
        store.insert(UserRecord::new("u-1", "Viewer"));
        store.insert(UserRecord {
            id: None,
            username: Some("orphan".into()),
            email: None,
            role: Some("Admin".into()),
            created_at: None,
        });
        assert_eq!(store.len(), 1);

        assert!(store.remove("u-1").is_some());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_arc_delegates() {
        let store: Arc<dyn UserRoleLookup> = Arc::new({
            let store = InMemoryUserStore::new();
            store.insert(UserRecord::new("u-1", "Admin"));
            store
        });

        let record = store.lookup_role_by_id("u-1").await.unwrap();
        assert_eq!(record.role_name(), Some("Admin"));
    }
}
