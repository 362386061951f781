//! Composite index model.
//!
//! Single-field queries (one filter field, optionally sorted by that same
//! field) and unfiltered sorted scans are always servable. Any query
//! constraining more than one distinct field needs a registered composite
//! index, or it fails with [`StoreError::IndexRequired`] naming the missing
//! index. This mirrors how document databases reject unindexed composite
//! queries instead of degrading to a scan.

use crate::Query;
use crate::error::{StoreError, StoreResult};

/// A registered composite index: a collection plus the set of fields it
/// covers (filter fields and the sort field together).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeIndex {
    pub collection: String,
    pub fields: Vec<String>,
}

impl CompositeIndex {
    pub fn new(collection: impl Into<String>, fields: &[&str]) -> Self {
        let mut fields: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
        fields.sort();
        fields.dedup();
        Self {
            collection: collection.into(),
            fields,
        }
    }

    /// Render as `collection(field, field, ...)` for error messages.
    pub fn describe(&self) -> String {
        format!("{}({})", self.collection, self.fields.join(", "))
    }
}

/// Validate that a query is servable with the registered indexes.
pub fn check_query(query: &Query, indexes: &[CompositeIndex]) -> StoreResult<()> {
    let constrained = query.constrained_fields();
    if constrained.len() <= 1 {
        return Ok(());
    }
    let needed = CompositeIndex {
        collection: query.collection.clone(),
        fields: constrained,
    };
    if indexes.contains(&needed) {
        Ok(())
    } else {
        Err(StoreError::IndexRequired {
            index: needed.describe(),
        })
    }
}

/// The index manifest the application needs.
///
/// Movement history pages push down any combination of customer, movement
/// kind and asset kind, always sorted newest-first; asset lists push down
/// kind and the two status dimensions, sorted by code.
pub fn default_indexes() -> Vec<CompositeIndex> {
    let mut indexes = Vec::new();

    let movement_filters: [&[&str]; 6] = [
        &["customer_id"],
        &["kind"],
        &["asset_kind"],
        &["customer_id", "kind"],
        &["kind", "asset_kind"],
        &["customer_id", "asset_kind"],
    ];
    for filters in movement_filters {
        let mut fields = filters.to_vec();
        fields.push("recorded_at");
        indexes.push(CompositeIndex::new("movements", &fields));
    }
    indexes.push(CompositeIndex::new(
        "movements",
        &["customer_id", "kind", "asset_kind", "recorded_at"],
    ));

    let asset_filters: [&[&str]; 6] = [
        &["kind"],
        &["status.location"],
        &["status.fill"],
        &["kind", "status.location"],
        &["kind", "status.fill"],
        &["status.fill", "status.location"],
    ];
    for filters in asset_filters {
        let mut fields = filters.to_vec();
        fields.push("code");
        indexes.push(CompositeIndex::new("assets", &fields));
    }
    indexes.push(CompositeIndex::new(
        "assets",
        &["kind", "status.fill", "status.location", "code"],
    ));

    indexes
}
