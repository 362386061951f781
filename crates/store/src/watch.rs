//! Continuous change subscriptions.
//!
//! A [`Watch`] is a scoped subscription to a query's result set: the current
//! matching documents arrive as initial `Added` diffs, subsequent commits as
//! `Added`/`Modified`/`Removed` diffs. Dropping the `Watch` unsubscribes;
//! the store prunes dead senders on the next publish.

use std::sync::mpsc;
use std::time::Duration;

use crate::Query;
use crate::document::Document;

/// What happened to a document relative to the watched query's result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One diff delivered to a watcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DocChange {
    pub kind: ChangeKind,
    pub collection: String,
    pub doc: Document,
}

/// A live subscription handle. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Watch {
    rx: mpsc::Receiver<DocChange>,
}

impl Watch {
    pub(crate) fn new(rx: mpsc::Receiver<DocChange>) -> Self {
        Self { rx }
    }

    /// Block until the next diff arrives or the store is dropped.
    pub fn recv(&self) -> Option<DocChange> {
        self.rx.recv().ok()
    }

    /// Block up to `timeout` for the next diff.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<DocChange> {
        self.rx.recv_timeout(timeout).ok()
    }

    /// Drain every diff already delivered, without blocking.
    pub fn drain(&self) -> Vec<DocChange> {
        let mut changes = Vec::new();
        while let Ok(change) = self.rx.try_recv() {
            changes.push(change);
        }
        changes
    }
}

/// Store-side half of a subscription.
#[derive(Debug)]
pub(crate) struct Watcher {
    pub query: Query,
    pub tx: mpsc::Sender<DocChange>,
}
