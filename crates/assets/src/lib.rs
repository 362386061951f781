//! `kegtrail-assets` — the asset registry model.
//!
//! Trackable physical units (beer kegs, CO2 cylinders): kind, format, the
//! two-dimensional status (fill state + location), code generation and the
//! dwell-time/critical predicate.

pub mod asset;
pub mod dwell;

pub use asset::{
    Asset, AssetKind, AssetStatus, FillState, Location, BATCH_QUANTITY_MAX, BATCH_QUANTITY_MIN,
    format_code, next_code, validate_batch_quantity, validate_format,
};
pub use dwell::{CRITICAL_DWELL_DAYS, days_at_customer, is_critical};
