//! State projections derived from the ledger.
//!
//! Pure functions of an `(assets, movements)` snapshot; recomputing from the
//! same snapshot always yields the same result.

use std::collections::{BTreeMap, HashMap, HashSet};

use kegtrail_assets::{Asset, Location};
use kegtrail_core::{AssetId, CustomerId};
use kegtrail_ledger::Movement;
use serde::Serialize;

/// Current holdings of one customer, broken down by format label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerHoldings {
    pub customer_id: CustomerId,
    pub customer_name: String,
    /// Format label (CO2 formats labeled distinctly) to unit count.
    pub by_format: BTreeMap<String, u64>,
    pub total: u64,
}

/// Per-customer holdings plus the grand total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldingsReport {
    pub customers: Vec<CustomerHoldings>,
    pub grand_total: u64,
}

impl HoldingsReport {
    /// Current-possession count for one customer (0 if absent).
    pub fn total_for(&self, customer_id: CustomerId) -> u64 {
        self.customers
            .iter()
            .find(|c| c.customer_id == customer_id)
            .map(|c| c.total)
            .unwrap_or(0)
    }
}

/// Attribute every asset currently at a customer to its holder.
///
/// For each `EnCliente` asset, the holder is the customer of the asset's most
/// recent delivery movement; ties on `recorded_at` break by movement id, so
/// the attribution is deterministic. Assets with no delivery movement on
/// record (ledger corrected away, or seeded data) are skipped.
pub fn holdings_by_customer(assets: &[Asset], movements: &[Movement]) -> HoldingsReport {
    // Most recent delivery per asset.
    let mut last_delivery: HashMap<AssetId, &Movement> = HashMap::new();
    for m in movements.iter().filter(|m| m.kind.is_delivery()) {
        last_delivery
            .entry(m.asset_id)
            .and_modify(|current| {
                if (m.recorded_at, m.id) > (current.recorded_at, current.id) {
                    *current = m;
                }
            })
            .or_insert(m);
    }

    let mut per_customer: BTreeMap<(String, CustomerId), CustomerHoldings> = BTreeMap::new();
    let mut grand_total = 0u64;
    for asset in assets
        .iter()
        .filter(|a| a.status.location == Location::EnCliente)
    {
        let Some(delivery) = last_delivery.get(&asset.id) else {
            tracing::warn!(asset = %asset.code, "EN_CLIENTE asset has no delivery movement, skipping");
            continue;
        };
        let entry = per_customer
            .entry((delivery.customer_name.clone(), delivery.customer_id))
            .or_insert_with(|| CustomerHoldings {
                customer_id: delivery.customer_id,
                customer_name: delivery.customer_name.clone(),
                by_format: BTreeMap::new(),
                total: 0,
            });
        *entry.by_format.entry(asset.format_label()).or_insert(0) += 1;
        entry.total += 1;
        grand_total += 1;
    }

    HoldingsReport {
        customers: per_customer.into_values().collect(),
        grand_total,
    }
}

/// Number of distinct assets ever associated with a customer.
///
/// Monotonically non-decreasing over the ledger's life, and always at least
/// the customer's current-possession count.
pub fn historical_distinct_assets(movements: &[Movement], customer_id: CustomerId) -> usize {
    movements
        .iter()
        .filter(|m| m.customer_id == customer_id)
        .map(|m| m.asset_id)
        .collect::<HashSet<_>>()
        .len()
}
