use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "assets.create").
/// A special wildcard permission `"*"` indicates "allow all" without
/// hardcoding the full catalog into tokens or policy tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The permission catalog.
pub mod catalog {
    pub const WILDCARD: &str = "*";

    pub const ASSETS_READ: &str = "assets.read";
    pub const ASSETS_CREATE: &str = "assets.create";
    pub const ASSETS_UPDATE: &str = "assets.update";
    pub const ASSETS_DELETE: &str = "assets.delete";

    pub const CUSTOMERS_READ: &str = "customers.read";
    pub const CUSTOMERS_CREATE: &str = "customers.create";
    pub const CUSTOMERS_UPDATE: &str = "customers.update";
    pub const CUSTOMERS_DELETE: &str = "customers.delete";

    pub const MOVEMENTS_READ: &str = "movements.read";
    pub const MOVEMENTS_RECORD: &str = "movements.record";
    /// Movement deletion is a correction mechanism, not a state transition.
    pub const MOVEMENTS_DELETE: &str = "movements.delete";

    pub const USERS_READ: &str = "users.read";
    pub const USERS_MANAGE: &str = "users.manage";

    pub const REPORTS_READ: &str = "reports.read";
}

/// Role-to-permission mapping.
///
/// Admin is the wildcard; Operator can create/update and record but never
/// delete; Viewer is read-only.
pub fn permissions_for(role: Role) -> Vec<Permission> {
    use catalog::*;
    match role {
        Role::Admin => vec![Permission::new(WILDCARD)],
        Role::Operator => [
            ASSETS_READ,
            ASSETS_CREATE,
            ASSETS_UPDATE,
            CUSTOMERS_READ,
            CUSTOMERS_CREATE,
            CUSTOMERS_UPDATE,
            MOVEMENTS_READ,
            MOVEMENTS_RECORD,
            REPORTS_READ,
        ]
        .into_iter()
        .map(Permission::new)
        .collect(),
        Role::Viewer => [ASSETS_READ, CUSTOMERS_READ, MOVEMENTS_READ, REPORTS_READ]
            .into_iter()
            .map(Permission::new)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_gets_the_wildcard_only() {
        let perms = permissions_for(Role::Admin);
        assert_eq!(perms.len(), 1);
        assert!(perms[0].is_wildcard());
    }

    #[test]
    fn operator_never_gets_deletes() {
        for p in permissions_for(Role::Operator) {
            assert!(!p.as_str().ends_with(".delete"), "{p}");
        }
    }

    #[test]
    fn viewer_is_read_only() {
        for p in permissions_for(Role::Viewer) {
            assert!(p.as_str().ends_with(".read"), "{p}");
        }
    }
}
