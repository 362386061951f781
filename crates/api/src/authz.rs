//! API-side authorization guard for handlers.
//!
//! This enforces authorization at the route boundary (before any store
//! access), keeping the tracking and store crates auth-agnostic.

use axum::http::StatusCode;
use axum::response::Response;

use kegtrail_auth::{Permission, authorize};

use crate::app::errors;
use crate::context::PrincipalContext;

/// Check one required permission for the current request principal.
///
/// Returns the ready-to-send 403 response on denial.
pub fn require(principal: &PrincipalContext, permission: &'static str) -> Result<(), Response> {
    authorize(principal.role(), &Permission::new(permission)).map_err(|e| {
        errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string())
    })
}
