//! Read-side queries: filtered, cursor-paged views over movements, assets and
//! customers.
//!
//! Predicates the store can express (equality on denormalized fields) are
//! pushed down; the rest (name substring, the critical-dwell cross-reference)
//! are evaluated client-side over a superset fetch. When a residual predicate
//! is active the reported total comes from the pushed-down query only and is
//! flagged as an estimate.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

use kegtrail_assets::{Asset, AssetKind, FillState, Location, is_critical};
use kegtrail_core::CustomerId;
use kegtrail_customers::Customer;
use kegtrail_ledger::{Movement, MovementKind};
use kegtrail_store::{Cursor, DocumentStore, Query, StoreError};

use crate::collections;

/// Page sizes per view.
pub const MOVEMENTS_PAGE_SIZE: usize = 15;
pub const CUSTOMERS_PAGE_SIZE: usize = 10;
pub const ASSETS_PAGE_SIZE: usize = 15;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Filters over the movement history.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub customer_id: Option<CustomerId>,
    /// Case-insensitive substring on the denormalized customer name
    /// (client-side).
    pub customer_name_contains: Option<String>,
    pub asset_kind: Option<AssetKind>,
    pub kind: Option<MovementKind>,
    /// Only movements of assets currently critical (client-side).
    pub critical_only: bool,
}

impl HistoryFilter {
    fn has_residual(&self) -> bool {
        self.customer_name_contains.is_some() || self.critical_only
    }
}

/// Filters over the customer directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerFilter {
    pub name_contains: Option<String>,
}

/// Filters over the asset list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetFilter {
    pub kind: Option<AssetKind>,
    pub location: Option<Location>,
    pub fill: Option<FillState>,
    /// Only critical assets (client-side; needs dwell math).
    pub critical_only: bool,
}

/// One page of results plus paging state.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next page; `None` when the result set is exhausted.
    pub cursor: Option<Cursor>,
    /// Count of the pushed-down query's full result set.
    pub total: u64,
    /// True when a client-side predicate makes `total` an upper bound rather
    /// than an exact count.
    pub total_is_estimate: bool,
}

/// Session-scoped stack of page-start cursors.
///
/// Forward paging is unlimited; backward paging replays cursors already
/// visited in this session (the store has no offset seeks).
#[derive(Debug, Default)]
pub struct CursorTrail {
    visited: Vec<Cursor>,
}

impl CursorTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start cursor of the page being navigated to.
    pub fn forward(&mut self, start: Cursor) {
        self.visited.push(start);
    }

    /// Step back one page: returns the start cursor of the previous page
    /// (`None` = the first page).
    pub fn back(&mut self) -> Option<Cursor> {
        self.visited.pop();
        self.visited.last().cloned()
    }

    /// Start cursor of the current page.
    pub fn current(&self) -> Option<Cursor> {
        self.visited.last().cloned()
    }

    /// Filters changed: everything visited is stale.
    pub fn reset(&mut self) {
        self.visited.clear();
    }
}

/// Monotonic request-generation counter guarding against out-of-order
/// completions: a fetch started under an older generation must be dropped,
/// not applied (last-filter-wins).
#[derive(Debug, Default)]
pub struct Generation(AtomicU64);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a new generation (call on every filter change) and return it.
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }

    /// Should a completion carrying `generation` still be applied?
    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Read-side query service.
///
/// Stateless per call; clients holding a paging session combine it with
/// [`CursorTrail`] (back navigation) and [`Generation`] (discarding
/// completions of superseded filter sets).
pub struct HistoryQuery<S: DocumentStore> {
    store: S,
}

impl<S: DocumentStore> HistoryQuery<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// One page of movement history, newest first.
    pub fn movements_page(
        &self,
        filter: &HistoryFilter,
        cursor: Option<Cursor>,
        now: DateTime<Utc>,
    ) -> Result<Page<Movement>, QueryError> {
        let mut query = Query::collection(collections::MOVEMENTS).sort_desc("recorded_at");
        if let Some(customer_id) = filter.customer_id {
            query = query.filter_eq("customer_id", json!(customer_id.to_string()));
        }
        if let Some(kind) = filter.kind {
            query = query.filter_eq("kind", json!(kind.as_str()));
        }
        if let Some(asset_kind) = filter.asset_kind {
            query = query.filter_eq("asset_kind", json!(asset_kind.as_str()));
        }

        let critical_assets = if filter.critical_only {
            Some(self.critical_asset_ids(now)?)
        } else {
            None
        };
        let name_needle = filter
            .customer_name_contains
            .as_ref()
            .map(|n| n.to_lowercase());

        self.fetch_page(
            query,
            MOVEMENTS_PAGE_SIZE,
            cursor,
            filter.has_residual(),
            |movement: &Movement| {
                if let Some(needle) = &name_needle {
                    if !movement.customer_name.to_lowercase().contains(needle) {
                        return false;
                    }
                }
                if let Some(critical) = &critical_assets {
                    if !critical.contains(&movement.asset_id.to_string()) {
                        return false;
                    }
                }
                true
            },
        )
    }

    /// One page of the customer directory, by name.
    pub fn customers_page(
        &self,
        filter: &CustomerFilter,
        cursor: Option<Cursor>,
    ) -> Result<Page<Customer>, QueryError> {
        let query = Query::collection(collections::CUSTOMERS).sort_asc("name");
        let needle = filter.name_contains.as_ref().map(|n| n.to_lowercase());
        self.fetch_page(
            query,
            CUSTOMERS_PAGE_SIZE,
            cursor,
            needle.is_some(),
            |customer: &Customer| match &needle {
                Some(needle) => customer.name.to_lowercase().contains(needle),
                None => true,
            },
        )
    }

    /// One page of the asset registry, by code.
    pub fn assets_page(
        &self,
        filter: &AssetFilter,
        cursor: Option<Cursor>,
        now: DateTime<Utc>,
    ) -> Result<Page<Asset>, QueryError> {
        let mut query = Query::collection(collections::ASSETS).sort_asc("code");
        if let Some(kind) = filter.kind {
            query = query.filter_eq("kind", json!(kind.as_str()));
        }
        if let Some(location) = filter.location {
            query = query.filter_eq("status.location", json!(location.as_str()));
        }
        if let Some(fill) = filter.fill {
            query = query.filter_eq("status.fill", json!(fill.as_str()));
        }

        let critical_only = filter.critical_only;
        self.fetch_page(query, ASSETS_PAGE_SIZE, cursor, critical_only, |asset| {
            !critical_only || is_critical(asset, now)
        })
    }

    /// Ids of every currently-critical asset (superset fetch: all EN_CLIENTE
    /// assets, dwell filtered in memory).
    fn critical_asset_ids(&self, now: DateTime<Utc>) -> Result<std::collections::HashSet<String>, QueryError> {
        let query = Query::collection(collections::ASSETS)
            .filter_eq("status.location", json!(Location::EnCliente.as_str()));
        let docs = self.store.query(&query)?;
        let mut ids = std::collections::HashSet::new();
        for doc in docs {
            let asset: Asset = doc.to_typed()?;
            if is_critical(&asset, now) {
                ids.insert(doc.id);
            }
        }
        Ok(ids)
    }

    /// Fill one page, fetching store pages repeatedly while a residual
    /// predicate rejects rows, until the page is full or the collection is
    /// exhausted.
    ///
    /// The returned cursor always points at the last *included* store
    /// document, so resuming never skips rows the residual filter would have
    /// accepted.
    fn fetch_page<T, F>(
        &self,
        base: Query,
        page_size: usize,
        mut cursor: Option<Cursor>,
        residual_active: bool,
        mut residual: F,
    ) -> Result<Page<T>, QueryError>
    where
        T: DeserializeOwned,
        F: FnMut(&T) -> bool,
    {
        let total = self.store.count(&base)?;

        let mut items = Vec::with_capacity(page_size);
        let mut next_cursor = None;
        'outer: loop {
            let query = base
                .clone()
                .limit(page_size)
                .start_after(cursor.clone());
            let docs = self.store.query(&query)?;
            let exhausted = docs.len() < page_size;

            for doc in &docs {
                let item: T = doc.to_typed()?;
                cursor = Some(query.cursor_after(doc));
                if residual(&item) {
                    items.push(item);
                    if items.len() == page_size {
                        next_cursor = cursor.clone();
                        break 'outer;
                    }
                }
            }
            if exhausted {
                break;
            }
        }

        Ok(Page {
            items,
            cursor: next_cursor,
            total,
            total_is_estimate: residual_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_trail_backs_up_through_visited_pages() {
        let mut trail = CursorTrail::new();
        assert_eq!(trail.current(), None);

        let c1 = Cursor {
            sort_value: json!("a"),
            id: "1".into(),
        };
        let c2 = Cursor {
            sort_value: json!("b"),
            id: "2".into(),
        };
        trail.forward(c1.clone());
        trail.forward(c2.clone());
        assert_eq!(trail.current(), Some(c2));

        assert_eq!(trail.back(), Some(c1));
        assert_eq!(trail.back(), None); // back to the first page
        assert_eq!(trail.back(), None); // cannot go past it
    }

    #[test]
    fn stale_generations_are_dropped() {
        let generation = Generation::new();
        let first = generation.next();
        assert!(generation.is_current(first));

        let second = generation.next();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }
}
