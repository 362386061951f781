//! `kegtrail-store` — the document-store contract and its in-memory
//! implementation.
//!
//! Collections of JSON documents with point CRUD, equality/range/"in" filters
//! plus a single sort key, start-after cursors, server-side counts,
//! optimistic read-then-write transactions and continuous change
//! subscriptions. Composite queries require registered indexes, matching the
//! failure mode of the real database this abstracts.

pub mod contract;
pub mod document;
pub mod error;
pub mod index;
pub mod memory;
pub mod query;
pub mod transaction;
pub mod watch;

pub use contract::DocumentStore;
pub use document::{Document, field, to_document_data};
pub use error::{StoreError, StoreResult};
pub use index::{CompositeIndex, check_query, default_indexes};
pub use memory::{MAX_TXN_ATTEMPTS, MemoryStore};
pub use query::{Cursor, Filter, FilterOp, Query, SortDir, SortKey, cmp_json};
pub use transaction::Transaction;
pub use watch::{ChangeKind, DocChange, Watch};
