//! Dwell-time math: how long has an asset sat at its current location.

use chrono::{DateTime, Utc};

use crate::{Asset, Location};

/// An asset is "critical" once it has sat at a customer this many days.
pub const CRITICAL_DWELL_DAYS: i64 = 30;

/// Whole days since the asset's last movement.
///
/// Only meaningful for assets currently at a customer; callers filtering for
/// critical assets should combine this with the location check (or use
/// [`is_critical`]).
pub fn days_at_customer(asset: &Asset, now: DateTime<Utc>) -> i64 {
    (now - asset.last_movement_at).num_days()
}

/// True when the asset has been at a customer for `CRITICAL_DWELL_DAYS` or
/// more since its last movement.
pub fn is_critical(asset: &Asset, now: DateTime<Utc>) -> bool {
    asset.status.location == Location::EnCliente
        && days_at_customer(asset, now) >= CRITICAL_DWELL_DAYS
}
