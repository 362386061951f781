use serde::{Deserialize, Serialize};

use kegtrail_core::DomainError;

/// Role used for RBAC.
///
/// A closed set: the application has exactly three privilege tiers. The
/// role-to-permission mapping lives in [`crate::permissions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including deletes and user management.
    Admin,
    /// Day-to-day operations: record movements, manage assets and customers.
    Operator,
    /// Read-only access.
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Operator => "operator",
            Self::Viewer => "viewer",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "admin" => Ok(Self::Admin),
            "operator" => Ok(Self::Operator),
            "viewer" => Ok(Self::Viewer),
            other => Err(DomainError::validation(format!("unknown role '{other}'"))),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
