//! `kegtrail-ledger` — the append-only movement ledger model.
//!
//! Movement records (immutable, with denormalized snapshots), the canonical
//! movement vocabulary and the transition table mapping each movement kind to
//! its effect on an asset's fill state and location.

pub mod movement;
pub mod movement_kind;

pub use movement::{Movement, NewMovement};
pub use movement_kind::{MovementKind, TransitionEffect};
