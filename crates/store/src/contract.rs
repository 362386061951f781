//! The document-store contract.
//!
//! This trait is the seam where a real document database plugs in: collection
//! CRUD, filtered queries with one sort key and start-after cursors,
//! server-side counts, optimistic read-then-write transactions and continuous
//! change subscriptions. The crate ships [`crate::MemoryStore`], which honors
//! the whole contract (including the composite-index failure mode).

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::document::Document;
use crate::error::StoreResult;
use crate::query::Query;
use crate::transaction::Transaction;
use crate::watch::Watch;

pub trait DocumentStore: Send + Sync {
    /// Point read by id.
    fn get(&self, collection: &str, id: &str) -> StoreResult<Document>;

    /// Insert a document. The id is taken from the body's `id` field when
    /// present (caller-supplied), otherwise store-assigned.
    fn insert(&self, collection: &str, data: JsonValue) -> StoreResult<Document>;

    /// Replace an existing document's body.
    fn update(&self, collection: &str, id: &str, data: JsonValue) -> StoreResult<Document>;

    /// Delete a document by id.
    fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Run a filtered, sorted, paged query.
    fn query(&self, query: &Query) -> StoreResult<Vec<Document>>;

    /// Server-side count of the filtered set (ignores limit and cursor).
    fn count(&self, query: &Query) -> StoreResult<u64>;

    /// Run a read-then-write transaction.
    ///
    /// The body may run several times: commit validation failures are retried
    /// by the store (bounded attempts) before surfacing
    /// [`crate::StoreError::Conflict`]. Bodies must therefore be free of side
    /// effects outside the transaction. A non-conflict error returned by the
    /// body aborts immediately, and nothing staged is applied.
    fn run_transaction(
        &self,
        body: &mut dyn FnMut(&mut Transaction<'_>) -> StoreResult<()>,
    ) -> StoreResult<()>;

    /// Subscribe to a query's result set. The current matching documents are
    /// delivered as initial `Added` diffs; dropping the handle unsubscribes.
    fn watch(&self, query: Query) -> StoreResult<Watch>;
}

impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
        (**self).get(collection, id)
    }

    fn insert(&self, collection: &str, data: JsonValue) -> StoreResult<Document> {
        (**self).insert(collection, data)
    }

    fn update(&self, collection: &str, id: &str, data: JsonValue) -> StoreResult<Document> {
        (**self).update(collection, id, data)
    }

    fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        (**self).delete(collection, id)
    }

    fn query(&self, query: &Query) -> StoreResult<Vec<Document>> {
        (**self).query(query)
    }

    fn count(&self, query: &Query) -> StoreResult<u64> {
        (**self).count(query)
    }

    fn run_transaction(
        &self,
        body: &mut dyn FnMut(&mut Transaction<'_>) -> StoreResult<()>,
    ) -> StoreResult<()> {
        (**self).run_transaction(body)
    }

    fn watch(&self, query: Query) -> StoreResult<Watch> {
        (**self).watch(query)
    }
}
