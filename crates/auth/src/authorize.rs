use thiserror::Error;

use crate::{Permission, Role, permissions_for};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a role against one required permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(role: Role, required: &Permission) -> Result<(), AuthzError> {
    let granted = permissions_for(role);
    if granted
        .iter()
        .any(|p| p.is_wildcard() || p == required)
    {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}
