//! User records: actor identity plus role.
//!
//! Users live in the store's `users` collection and are read to resolve an
//! actor's role; management (create/role change/delete) is Admin-gated at the
//! API boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kegtrail_core::{DomainError, DomainResult, UserId};

use crate::Role;

/// One application user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Validate a user's email field. Deliberately shallow: the identity provider
/// owns real address verification.
pub fn validate_email(email: &str) -> DomainResult<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(DomainError::validation(format!(
            "invalid email '{email}'"
        )));
    }
    Ok(())
}
