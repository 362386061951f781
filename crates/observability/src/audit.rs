//! Audit-log sink.
//!
//! Structured entries written to the store's `app_logs` collection.
//! Delivery is asynchronous and best-effort: a failure to log must never
//! block or fail the primary operation it describes, so writes happen on a
//! background thread and failures only produce a `warn` trace.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kegtrail_store::DocumentStore;

/// Collection audit entries are written to. Write-only for the core.
pub const AUDIT_COLLECTION: &str = "app_logs";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Info,
    Warn,
    Error,
}

/// One audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub recorded_at: DateTime<Utc>,
    pub level: AuditLevel,
    pub message: String,
    /// Component that emitted the entry (e.g. "movement_recorder").
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
}

impl AuditEntry {
    pub fn new(level: AuditLevel, component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            recorded_at: Utc::now(),
            level,
            message: message.into(),
            component: component.into(),
            detail: None,
            user_email: None,
        }
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn user_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }
}

/// Destination for audit entries.
pub trait AuditSink: Send + Sync {
    /// Enqueue an entry. Must not block on the underlying store.
    fn record(&self, entry: AuditEntry);
}

/// Audit sink writing to the document store on a background thread.
pub struct StoreAuditSink {
    tx: mpsc::Sender<AuditEntry>,
}

impl StoreAuditSink {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let (tx, rx) = mpsc::channel::<AuditEntry>();
        thread::Builder::new()
            .name("audit-sink".to_string())
            .spawn(move || {
                while let Ok(entry) = rx.recv() {
                    let data = match serde_json::to_value(&entry) {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::warn!(error = %e, "audit entry failed to serialize");
                            continue;
                        }
                    };
                    if let Err(e) = store.insert(AUDIT_COLLECTION, data) {
                        tracing::warn!(error = %e, "audit entry dropped");
                    }
                }
            })
            .expect("failed to spawn audit-sink thread");
        Self { tx }
    }
}

impl AuditSink for StoreAuditSink {
    fn record(&self, entry: AuditEntry) {
        // Receiver gone means shutdown; dropping the entry is the contract.
        let _ = self.tx.send(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kegtrail_store::{MemoryStore, Query};
    use std::time::Duration;

    #[test]
    fn entries_land_in_app_logs() {
        let store = Arc::new(MemoryStore::new());
        let sink = StoreAuditSink::new(store.clone());

        sink.record(
            AuditEntry::new(AuditLevel::Error, "movement_recorder", "transaction failed")
                .detail("conflict retries exhausted")
                .user_email("op@example.com"),
        );

        // Background delivery; poll briefly.
        let q = Query::collection(AUDIT_COLLECTION);
        for _ in 0..50 {
            if store.count(&q).unwrap() == 1 {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("audit entry never arrived");
    }

    #[test]
    fn store_failure_does_not_propagate() {
        let store = Arc::new(MemoryStore::new());
        let sink = StoreAuditSink::new(store.clone());
        store.inject_unavailable(1);

        // Must not panic or surface an error.
        sink.record(AuditEntry::new(AuditLevel::Info, "test", "dropped"));
        thread::sleep(Duration::from_millis(50));
    }
}
