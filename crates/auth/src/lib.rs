//! `kegtrail-auth` — pure authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: roles, the
//! permission catalog, deterministic claims validation and the token-verifier
//! seam. HS256 signature verification lives in the API layer.

pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod roles;
pub mod user;

pub use authorize::{AuthzError, authorize};
pub use claims::{JwtClaims, TokenValidationError, TokenVerifier, validate_claims};
pub use permissions::{Permission, catalog, permissions_for};
pub use roles::Role;
pub use user::{User, validate_email};
