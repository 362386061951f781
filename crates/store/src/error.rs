//! Store error taxonomy.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Infrastructure-level store error.
///
/// Domain failures (validation, invariants) never originate here; these are
/// the failure modes of the document store itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced document does not exist.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// An insert collided with an existing document id.
    #[error("document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    /// An optimistic transaction exhausted its retry budget.
    #[error("transaction conflict: retries exhausted")]
    Conflict,

    /// The query needs a composite index that is not registered.
    ///
    /// Surfaced verbatim to the caller with the missing index named; never
    /// retried automatically.
    #[error("query requires a composite index: {index}")]
    IndexRequired { index: String },

    /// Transient store failure (network, quota). Retryable by the caller,
    /// never retried automatically.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A document could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    pub fn already_exists(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
