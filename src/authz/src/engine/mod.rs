//! Authorization decision engine
//!
//! Resolves the principal's current role through the user store and
//! compares ranks against the requirement.
//!
//! # Pipeline
//!
//! ```text
//! Principal ──► UserRoleLookup ──► rank(role) >= rank(required) ──► Decision
//!     │               │                                               │
//!     └─ absent ──────┴─ fault / empty role ──────────► Failed    [Metrics]
//! ```
//!
//! The engine holds no mutable state besides atomic counters: no cache, no
//! queue, no lock. Each call is a pure function of the user store at the
//! moment of its own lookup. Dropping the returned future abandons the
//! lookup and renders no decision.

pub mod decision;
pub mod metrics;

pub use decision::AuthorizationDecision;
pub use metrics::{EngineMetrics, MetricsCollector};

use crate::policy::{AuthorizationRequirement, PolicyRegistry};
use crate::role::{rank, Role};
use crate::store::UserRoleLookup;
use crate::types::Principal;
use decision::{DenialCause, Outcome};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
        }
    }
}

/// Decision engine shared by every request
pub struct AuthorizationEngine {
    /// External user-role lookup
    lookup: Arc<dyn UserRoleLookup>,

    /// Immutable policy table
    registry: Arc<PolicyRegistry>,

    /// Decision counters
    metrics: Option<Arc<MetricsCollector>>,
}

impl AuthorizationEngine {
    /// Create an engine with default configuration
    pub fn new(lookup: Arc<dyn UserRoleLookup>, registry: Arc<PolicyRegistry>) -> Self {
        Self::with_config(EngineConfig::default(), lookup, registry)
    }

    /// Create an engine with the given configuration
    pub fn with_config(
        config: EngineConfig,
        lookup: Arc<dyn UserRoleLookup>,
        registry: Arc<PolicyRegistry>,
    ) -> Self {
        let metrics = config
            .enable_metrics
            .then(|| Arc::new(MetricsCollector::new()));

        info!(
            policies = registry.len(),
            metrics = config.enable_metrics,
            "AuthorizationEngine initialized"
        );

        Self {
            lookup,
            registry,
            metrics,
        }
    }

    /// Evaluate a requirement against a principal
    ///
    /// Never fails: an absent principal, a store fault, an empty role and an
    /// insufficient rank all yield [`AuthorizationDecision::Failed`].
    pub async fn evaluate(
        &self,
        principal: Option<&Principal>,
        requirement: &AuthorizationRequirement,
    ) -> AuthorizationDecision {
        let start = Instant::now();
        let outcome = self.resolve(principal, requirement).await;

        let principal_id = principal.map(|p| p.id.as_str()).unwrap_or("");
        match &outcome {
            Outcome::Granted {
                user_rank,
                required_rank,
            } => {
                debug!(
                    principal = %principal_id,
                    required_role = %requirement.required_role,
                    user_rank,
                    required_rank,
                    "Authorization succeeded"
                );
            }
            Outcome::Denied(DenialCause::Lookup(fault)) => {
                warn!(
                    principal = %principal_id,
                    required_role = %requirement.required_role,
                    fault = fault.kind(),
                    error = %fault,
                    "User lookup failed, denying access"
                );
            }
            Outcome::Denied(cause) => {
                debug!(
                    principal = %principal_id,
                    required_role = %requirement.required_role,
                    cause = cause.label(),
                    "Authorization failed"
                );
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record(&outcome, start.elapsed());
        }

        outcome.decision()
    }

    /// Check a principal against a required role
    pub async fn check(
        &self,
        principal: Option<&Principal>,
        required_role: Role,
    ) -> AuthorizationDecision {
        self.evaluate(principal, &AuthorizationRequirement::new(required_role))
            .await
    }

    /// Check a principal against the policy registered under `policy_key`
    ///
    /// An unregistered key fails closed.
    pub async fn check_policy(
        &self,
        principal: Option<&Principal>,
        policy_key: &str,
    ) -> AuthorizationDecision {
        match self.registry.lookup(policy_key) {
            Some(requirement) => self.evaluate(principal, requirement).await,
            None => {
                warn!(policy = %policy_key, "No such policy, denying access");
                AuthorizationDecision::Failed
            }
        }
    }

    /// Check a principal against the requirement bound to `operation`
    ///
    /// An unbound operation fails closed.
    pub async fn check_operation(
        &self,
        principal: Option<&Principal>,
        operation: &str,
    ) -> AuthorizationDecision {
        match self.registry.requirement_for(operation) {
            Some(requirement) => self.evaluate(principal, requirement).await,
            None => {
                warn!(operation = %operation, "Operation has no policy binding, denying access");
                AuthorizationDecision::Failed
            }
        }
    }

    /// Policy table this engine evaluates against
    pub fn registry(&self) -> &Arc<PolicyRegistry> {
        &self.registry
    }

    /// Get engine metrics
    pub fn get_metrics(&self) -> Option<EngineMetrics> {
        self.metrics.as_ref().map(|metrics| metrics.snapshot())
    }

    /// Export engine metrics in Prometheus text format
    pub fn export_metrics(&self) -> Option<String> {
        self.metrics
            .as_ref()
            .map(|metrics| metrics.export_prometheus())
    }

    async fn resolve(
        &self,
        principal: Option<&Principal>,
        requirement: &AuthorizationRequirement,
    ) -> Outcome {
        let principal = match principal {
            Some(principal) if principal.has_id() => principal,
            _ => return Outcome::Denied(DenialCause::MissingPrincipal),
        };

        let record = match self.lookup.lookup_role_by_id(&principal.id).await {
            Ok(record) => record,
            Err(fault) => return Outcome::Denied(DenialCause::Lookup(fault)),
        };

        let Some(role_name) = record.role_name() else {
            return Outcome::Denied(DenialCause::MissingRole);
        };

        let user_rank = rank(role_name);
        let required_rank = requirement.required_role.rank();

        if user_rank >= required_rank {
            Outcome::Granted {
                user_rank,
                required_rank,
            }
        } else {
            Outcome::Denied(DenialCause::InsufficientRank {
                user_rank,
                required_rank,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupFault;
    use crate::store::InMemoryUserStore;
    use crate::types::UserRecord;

    fn engine_with(store: InMemoryUserStore) -> AuthorizationEngine {
        let registry = PolicyRegistry::builder()
            .bind("editor-action", "Editor")
            .build()
            .unwrap();
        AuthorizationEngine::new(Arc::new(store), Arc::new(registry))
    }

    #[tokio::test]
    async fn test_engine_creation() {
        let engine = engine_with(InMemoryUserStore::new());
        assert!(engine.metrics.is_some());
        assert_eq!(engine.registry().len(), 4);

        let registry = Arc::new(PolicyRegistry::builder().build().unwrap());
        let engine = AuthorizationEngine::with_config(
            EngineConfig { enable_metrics: false },
            Arc::new(InMemoryUserStore::new()),
            registry,
        );
        assert!(engine.get_metrics().is_none());
        assert!(engine.export_metrics().is_none());
    }

    #[tokio::test]
    async fn test_resolve_causes() {
        let store = InMemoryUserStore::new();
        store.insert(UserRecord::new("editor", "Editor"));
        store.insert(UserRecord::new("blank", ""));
        let engine = engine_with(store);
        let admin = AuthorizationRequirement::new(Role::Admin);

        assert_eq!(
            engine.resolve(None, &admin).await,
            Outcome::Denied(DenialCause::MissingPrincipal)
        );
        assert_eq!(
            engine.resolve(Some(&Principal::new("ghost")), &admin).await,
            Outcome::Denied(DenialCause::Lookup(LookupFault::NotFound))
        );
        assert_eq!(
            engine.resolve(Some(&Principal::new("blank")), &admin).await,
            Outcome::Denied(DenialCause::MissingRole)
        );
        assert_eq!(
            engine.resolve(Some(&Principal::new("editor")), &admin).await,
            Outcome::Denied(DenialCause::InsufficientRank {
                user_rank: 2,
                required_rank: 3
            })
        );
    }

    #[tokio::test]
    async fn test_check_operation_and_policy() {
        let store = InMemoryUserStore::new();
        store.insert(UserRecord::new("editor", "Editor"));
        let engine = engine_with(store);
        let editor = Principal::new("editor");

        assert!(engine
            .check_operation(Some(&editor), "editor-action")
            .await
            .is_succeeded());
        assert!(engine
            .check_operation(Some(&editor), "unbound")
            .await
            .is_failed());
        assert!(engine
            .check_policy(Some(&editor), "RequireRoleViewer")
            .await
            .is_succeeded());
        assert!(engine
            .check_policy(Some(&editor), "RequireRoleAdmin")
            .await
            .is_failed());
        assert!(engine
            .check_policy(Some(&editor), "RequireRoleOwner")
            .await
            .is_failed());
    }

    #[tokio::test]
    async fn test_metrics_recorded_per_evaluation() {
        let store = InMemoryUserStore::new();
        store.insert(UserRecord::new("admin", "Admin"));
        let engine = engine_with(store);

        engine.check(Some(&Principal::new("admin")), Role::Editor).await;
        engine.check(None, Role::Viewer).await;

        let metrics = engine.get_metrics().unwrap();
        assert_eq!(metrics.total_decisions, 2);
        assert_eq!(metrics.succeeded, 1);
        assert_eq!(metrics.missing_principal, 1);
    }
}
