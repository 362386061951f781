//! `kegtrail-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers and the domain error model shared by every other
//! crate in the workspace.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{AssetId, CustomerId, MovementId, UserId};
