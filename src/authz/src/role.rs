//! Role hierarchy
//!
//! The closed set of roles and the total order over them. [`rank`] is the
//! only place the ordering is defined; every comparison in the crate goes
//! through it.

use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Rank assigned to any name outside the hierarchy
pub const UNRANKED: u8 = 0;

/// Named capability tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Viewer,
    Editor,
    Admin,
    SuperAdmin,
}

impl Role {
    /// Every role, lowest rank first
    pub const ALL: [Role; 4] = [Role::Viewer, Role::Editor, Role::Admin, Role::SuperAdmin];

    /// Canonical role name as stored in user records and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "Viewer",
            Role::Editor => "Editor",
            Role::Admin => "Admin",
            Role::SuperAdmin => "SuperAdmin",
        }
    }

    /// Position of this role in the hierarchy (always >= 1)
    pub fn rank(&self) -> u8 {
        rank(self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AuthzError::UnknownRole(s.to_string()))
    }
}

/// Rank of a role name. Total and pure: unknown names rank [`UNRANKED`].
///
/// Matching is exact; `"admin"` is not `"Admin"`.
pub fn rank(role_name: &str) -> u8 {
    match role_name {
        "Viewer" => 1,
        "Editor" => 2,
        "Admin" => 3,
        "SuperAdmin" => 4,
        _ => UNRANKED,
    }
}
