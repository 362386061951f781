//! `kegtrail-tracking` — the tracking core.
//!
//! The movement recorder (atomic ledger append + asset update), the state
//! projector (holdings, historical counts), the read-side query layer
//! (pushdown filters, residual client-side predicates, cursor paging) and
//! the CRUD write paths for assets and customers.

pub mod collections;
pub mod history;
pub mod projector;
pub mod recorder;
pub mod registry;

pub use history::{
    ASSETS_PAGE_SIZE, AssetFilter, CUSTOMERS_PAGE_SIZE, CursorTrail, CustomerFilter, Generation,
    HistoryFilter, HistoryQuery, MOVEMENTS_PAGE_SIZE, Page, QueryError,
};
pub use projector::{
    CustomerHoldings, HoldingsReport, historical_distinct_assets, holdings_by_customer,
};
pub use recorder::{MovementRecorder, RecordError};
pub use registry::{
    AssetRegistry, AssetUpdate, CustomerDirectory, NewAssetBatch, NewCustomer, RegistryError,
};
