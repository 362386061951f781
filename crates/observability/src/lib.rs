//! Tracing/logging setup and the audit-log sink.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Audit sink: best-effort structured log entries written to the store.
pub mod audit;

pub use audit::{AuditEntry, AuditLevel, AuditSink, StoreAuditSink};
