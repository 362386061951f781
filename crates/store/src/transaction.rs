//! Read-then-write optimistic transactions.
//!
//! A transaction body reads through [`Transaction::get`]/[`Transaction::query`]
//! and stages writes; commit validates that everything read is unchanged and
//! applies all staged writes atomically. On validation failure the store
//! re-runs the body (bounded attempts) before surfacing
//! [`StoreError::Conflict`].

use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::Query;
use crate::document::Document;
use crate::error::{StoreError, StoreResult};

/// What the transaction observed; compared against the live store at commit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ReadRecord {
    /// A point read: the document's revision at read time (`None` = absent).
    Doc {
        collection: String,
        id: String,
        revision: Option<u64>,
    },
    /// A query: recorded as a whole-collection scan. Any concurrent write to
    /// the collection invalidates the commit.
    Scan { collection: String, version: u64 },
}

#[derive(Debug, Clone)]
pub(crate) enum StagedOp {
    Insert(JsonValue),
    Update(JsonValue),
    Delete,
}

#[derive(Debug, Clone)]
pub(crate) struct StagedWrite {
    pub collection: String,
    pub id: String,
    pub op: StagedOp,
}

/// Backend view a transaction reads from.
pub(crate) trait TxnBackend {
    fn txn_get(&self, collection: &str, id: &str) -> Option<Document>;
    fn txn_collection_version(&self, collection: &str) -> u64;
    fn txn_query(&self, query: &Query) -> StoreResult<Vec<Document>>;
}

/// An in-flight transaction: a read set plus staged writes.
pub struct Transaction<'a> {
    backend: &'a dyn TxnBackend,
    pub(crate) reads: Vec<ReadRecord>,
    pub(crate) writes: Vec<StagedWrite>,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(backend: &'a dyn TxnBackend) -> Self {
        Self {
            backend,
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Read a document, recording its revision in the read set.
    ///
    /// A missing document is recorded as an absence read before the error is
    /// returned, so absence observed by a surviving body keeps the commit
    /// honest too.
    pub fn get(&mut self, collection: &str, id: &str) -> StoreResult<Document> {
        let doc = self.backend.txn_get(collection, id);
        self.reads.push(ReadRecord::Doc {
            collection: collection.to_string(),
            id: id.to_string(),
            revision: doc.as_ref().map(|d| d.revision),
        });
        doc.ok_or_else(|| StoreError::not_found(collection, id))
    }

    /// Run a query inside the transaction.
    pub fn query(&mut self, query: &Query) -> StoreResult<Vec<Document>> {
        self.reads.push(ReadRecord::Scan {
            collection: query.collection.clone(),
            version: self.backend.txn_collection_version(&query.collection),
        });
        self.backend.txn_query(query)
    }

    /// Stage an insert; the id is taken from the body's `id` field when
    /// present, otherwise assigned. Returns the id.
    pub fn insert(&mut self, collection: &str, mut data: JsonValue) -> StoreResult<String> {
        let id = match data.get("id").and_then(JsonValue::as_str) {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::now_v7().to_string();
                if let Some(obj) = data.as_object_mut() {
                    obj.insert("id".to_string(), JsonValue::String(id.clone()));
                }
                id
            }
        };
        self.writes.push(StagedWrite {
            collection: collection.to_string(),
            id: id.clone(),
            op: StagedOp::Insert(data),
        });
        Ok(id)
    }

    /// Stage a full-body update of an existing document.
    pub fn update(&mut self, collection: &str, id: &str, data: JsonValue) {
        self.writes.push(StagedWrite {
            collection: collection.to_string(),
            id: id.to_string(),
            op: StagedOp::Update(data),
        });
    }

    /// Stage a delete.
    pub fn delete(&mut self, collection: &str, id: &str) {
        self.writes.push(StagedWrite {
            collection: collection.to_string(),
            id: id.to_string(),
            op: StagedOp::Delete,
        });
    }
}
