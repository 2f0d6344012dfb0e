//! Policy registry
//!
//! One policy per role in the hierarchy, keyed `RequireRole<Name>`, plus the
//! bindings from protected operations to those policies. Everything is
//! resolved once in [`PolicyRegistryBuilder::build`]; the resulting
//! [`PolicyRegistry`] is immutable and meant to be shared behind an `Arc`.
//!
//! # Example
//!
//! ```rust
//! use rolegate_authz::policy::PolicyRegistry;
//! use rolegate_authz::Role;
//!
//! let registry = PolicyRegistry::builder()
//!     .bind("viewer-content", "Viewer")
//!     .bind("admin-update", "Admin")
//!     .build()
//!     .unwrap();
//!
//! let requirement = registry.requirement_for("admin-update").unwrap();
//! assert_eq!(requirement.required_role, Role::Admin);
//! ```

use crate::error::{AuthzError, Result};
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Prefix of every policy key
pub const POLICY_KEY_PREFIX: &str = "RequireRole";

/// Policy key guarding operations that require `role`
pub fn policy_key(role: Role) -> String {
    format!("{}{}", POLICY_KEY_PREFIX, role)
}

/// Minimum role a principal must hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthorizationRequirement {
    pub required_role: Role,
}

impl AuthorizationRequirement {
    pub fn new(required_role: Role) -> Self {
        Self { required_role }
    }

    /// Key of the policy carrying this requirement
    pub fn policy_key(&self) -> String {
        policy_key(self.required_role)
    }
}

/// Binding of a protected operation to a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationBinding {
    /// Operation identifier (e.g. "editor-action")
    pub operation: String,

    /// Role name exactly as declared
    pub required_role: String,
}

impl OperationBinding {
    pub fn new(operation: impl Into<String>, required_role: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            required_role: required_role.into(),
        }
    }
}

/// Immutable policy and binding table
#[derive(Debug, Clone)]
pub struct PolicyRegistry {
    policies: HashMap<String, AuthorizationRequirement>,
    bindings: BTreeMap<String, String>,
}

impl PolicyRegistry {
    /// Start a registry pre-populated with one policy per role
    pub fn builder() -> PolicyRegistryBuilder {
        PolicyRegistryBuilder::new()
    }

    /// Requirement registered under a policy key
    pub fn lookup(&self, policy_key: &str) -> Option<&AuthorizationRequirement> {
        self.policies.get(policy_key)
    }

    /// Requirement guarding a bound operation
    pub fn requirement_for(&self, operation: &str) -> Option<&AuthorizationRequirement> {
        self.bindings
            .get(operation)
            .and_then(|key| self.policies.get(key))
    }

    /// Like [`requirement_for`](Self::requirement_for), for callers that
    /// treat a missing binding as a wiring bug
    pub fn require(&self, operation: &str) -> Result<AuthorizationRequirement> {
        self.requirement_for(operation)
            .copied()
            .ok_or_else(|| AuthzError::UnknownOperation(operation.to_string()))
    }

    /// Policy key bound to an operation
    pub fn policy_for(&self, operation: &str) -> Option<&str> {
        self.bindings.get(operation).map(String::as_str)
    }

    /// Bound operations and their policy keys, ordered by operation
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(operation, key)| (operation.as_str(), key.as_str()))
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// Collects operation bindings and validates them in one pass
#[derive(Debug, Default)]
pub struct PolicyRegistryBuilder {
    bindings: Vec<OperationBinding>,
    overrides: Vec<OperationBinding>,
}

impl PolicyRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the required role of an operation
    pub fn bind(mut self, operation: impl Into<String>, required_role: impl Into<String>) -> Self {
        self.bindings
            .push(OperationBinding::new(operation, required_role));
        self
    }

    /// Declare several bindings at once
    pub fn bind_all(mut self, bindings: impl IntoIterator<Item = OperationBinding>) -> Self {
        self.bindings.extend(bindings);
        self
    }

    /// Replace the role of an already declared operation
    ///
    /// Used for configuration-file overrides; the operation must have been
    /// declared with [`bind`](Self::bind).
    pub fn rebind(mut self, operation: impl Into<String>, required_role: impl Into<String>) -> Self {
        self.overrides
            .push(OperationBinding::new(operation, required_role));
        self
    }

    /// Resolve every binding against the hierarchy
    ///
    /// # Errors
    ///
    /// - [`AuthzError::UnknownRole`] if a binding names a role outside the hierarchy
    /// - [`AuthzError::DuplicateBinding`] if an operation is declared twice
    /// - [`AuthzError::UnknownOperation`] if an override targets an undeclared operation
    /// - [`AuthzError::InvalidInput`] if an operation identifier is empty
    pub fn build(self) -> Result<PolicyRegistry> {
        let policies: HashMap<String, AuthorizationRequirement> = Role::ALL
            .into_iter()
            .map(|role| (policy_key(role), AuthorizationRequirement::new(role)))
            .collect();

        let mut bindings = BTreeMap::new();
        for binding in &self.bindings {
            if binding.operation.trim().is_empty() {
                return Err(AuthzError::InvalidInput(
                    "Operation identifier cannot be empty".to_string(),
                ));
            }

            let role: Role = binding.required_role.parse()?;
            if bindings
                .insert(binding.operation.clone(), policy_key(role))
                .is_some()
            {
                return Err(AuthzError::DuplicateBinding(binding.operation.clone()));
            }

            debug!(operation = %binding.operation, role = %role, "Bound operation");
        }

        for binding in &self.overrides {
            let role: Role = binding.required_role.parse()?;
            match bindings.get_mut(&binding.operation) {
                Some(key) => *key = policy_key(role),
                None => return Err(AuthzError::UnknownOperation(binding.operation.clone())),
            }

            info!(operation = %binding.operation, role = %role, "Overrode operation binding");
        }

        info!(
            policies = policies.len(),
            bindings = bindings.len(),
            "Policy registry built"
        );

        Ok(PolicyRegistry { policies, bindings })
    }
}
