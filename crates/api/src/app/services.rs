//! Service wiring: the store, the write/read paths over it, the audit sink
//! and the realtime change feed behind `/stream`.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use serde_json::json;
use tokio::sync::broadcast;
use tokio_stream::{StreamExt, wrappers::BroadcastStream};

use kegtrail_observability::StoreAuditSink;
use kegtrail_store::{ChangeKind, DocumentStore, MemoryStore, Query, default_indexes};
use kegtrail_tracking::{
    AssetRegistry, CustomerDirectory, HistoryQuery, MovementRecorder, collections,
};

/// One notification pushed to `/stream` subscribers.
#[derive(Debug, Clone)]
pub struct RealtimeMessage {
    pub topic: &'static str,
    pub payload: serde_json::Value,
}

pub struct AppServices {
    pub store: Arc<MemoryStore>,
    pub recorder: MovementRecorder<Arc<MemoryStore>>,
    pub assets: AssetRegistry<Arc<MemoryStore>>,
    pub customers: CustomerDirectory<Arc<MemoryStore>>,
    pub history: HistoryQuery<Arc<MemoryStore>>,
    pub audit: StoreAuditSink,
    realtime_tx: broadcast::Sender<RealtimeMessage>,
}

pub fn build_services() -> AppServices {
    let store = Arc::new(MemoryStore::with_indexes(default_indexes()));
    let (realtime_tx, _) = broadcast::channel(256);

    forward_changes(Arc::clone(&store), collections::MOVEMENTS, realtime_tx.clone());
    forward_changes(Arc::clone(&store), collections::ASSETS, realtime_tx.clone());

    AppServices {
        recorder: MovementRecorder::new(Arc::clone(&store)),
        assets: AssetRegistry::new(Arc::clone(&store)),
        customers: CustomerDirectory::new(Arc::clone(&store)),
        history: HistoryQuery::new(Arc::clone(&store)),
        audit: StoreAuditSink::new(Arc::clone(&store) as Arc<dyn DocumentStore>),
        store,
        realtime_tx,
    }
}

/// Bridge one collection's store watch (sync mpsc) onto the broadcast feed.
fn forward_changes(
    store: Arc<MemoryStore>,
    collection: &'static str,
    tx: broadcast::Sender<RealtimeMessage>,
) {
    std::thread::Builder::new()
        .name(format!("watch-{collection}"))
        .spawn(move || {
            let watch = match store.watch(Query::collection(collection)) {
                Ok(w) => w,
                Err(e) => {
                    tracing::warn!(collection, error = %e, "change feed unavailable");
                    return;
                }
            };
            while let Some(change) = watch.recv() {
                let kind = match change.kind {
                    ChangeKind::Added => "added",
                    ChangeKind::Modified => "modified",
                    ChangeKind::Removed => "removed",
                };
                let message = RealtimeMessage {
                    topic: collection,
                    payload: json!({
                        "kind": kind,
                        "collection": change.collection,
                        "id": change.doc.id,
                        "data": change.doc.data,
                    }),
                };
                // No subscribers is fine; they come and go.
                let _ = tx.send(message);
            }
        })
        .expect("failed to spawn watch forwarder thread");
}

/// SSE stream of ledger/asset change notifications.
pub fn sse_stream(
    services: Arc<AppServices>,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(m) => {
            let data = serde_json::to_string(&m.payload).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event(m.topic).data(data)))
        }
        // Lagged subscribers skip ahead rather than failing the stream.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
