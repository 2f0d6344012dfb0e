//! Authorization decision types

use crate::error::LookupFault;
use serde::{Deserialize, Serialize};

/// Binary outcome of evaluating one requirement against one principal
///
/// Carries no reason on purpose: callers turn `Failed` into a plain
/// access-denied response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorizationDecision {
    Succeeded,
    Failed,
}

impl AuthorizationDecision {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, AuthorizationDecision::Succeeded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, AuthorizationDecision::Failed)
    }
}

/// Why a request was denied. Logged and counted, never returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DenialCause {
    /// No principal, or an empty identifier
    MissingPrincipal,

    /// The user store could not produce a record
    Lookup(LookupFault),

    /// Record exists but its role is empty or absent
    MissingRole,

    /// Held role ranks below the requirement (0 for unknown names)
    InsufficientRank { user_rank: u8, required_rank: u8 },
}

impl DenialCause {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            DenialCause::MissingPrincipal => "missing_principal",
            DenialCause::Lookup(_) => "lookup_fault",
            DenialCause::MissingRole => "missing_role",
            DenialCause::InsufficientRank { .. } => "insufficient_rank",
        }
    }
}

/// Internal result of one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Granted { user_rank: u8, required_rank: u8 },
    Denied(DenialCause),
}

impl Outcome {
    pub(crate) fn decision(&self) -> AuthorizationDecision {
        match self {
            Outcome::Granted { .. } => AuthorizationDecision::Succeeded,
            Outcome::Denied(_) => AuthorizationDecision::Failed,
        }
    }
}
