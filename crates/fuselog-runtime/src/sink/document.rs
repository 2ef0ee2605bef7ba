//! Document store sink.
//!
//! The sink turns records into documents and hands them to a
//! [`DocumentStore`]. Stores come from the [`DocumentStoreConnector`] the host
//! supplies to the logging context; without one, every write fails and the
//! failure is reported once.
//!
//! When a tokio runtime is running, inserts are spawned on it and the
//! emitting call returns immediately. Otherwise the insert runs inline.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use fuselog_core::{Record, Severity};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::trace;

use super::{FailureLatch, Sink, SinkDescriptor, SinkKind, SinkParams};
use crate::error::{SinkError, SinkResult};

/// Collection used when the logger has no file tag.
pub const DEFAULT_COLLECTION: &str = "log";

/// A place documents can be inserted into.
///
/// Outside a tokio runtime, `insert` is driven by a plain executor on the
/// emitting thread. Implementations relying on tokio I/O or timers should
/// only be used from within a runtime; a panic raised while driving an
/// insert inline is turned into a write error.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts one document into `collection`.
    ///
    /// With `safe`, the store should only return once the write is
    /// acknowledged.
    async fn insert(&self, collection: &str, document: Value, safe: bool) -> SinkResult<()>;
}

/// Opens a [`DocumentStore`] for a connection string.
///
/// Connecting must not fail eagerly; connection problems surface as write
/// errors.
pub trait DocumentStoreConnector: Send + Sync {
    fn connect(&self, db: &str) -> Arc<dyn DocumentStore>;
}

// ─── Built-in stores ──────────────────────────────────────────────────────────

/// Connector used when the host supplies none. Every write fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredStore;

struct Unconfigured {
    db: String,
}

#[async_trait]
impl DocumentStore for Unconfigured {
    async fn insert(&self, _collection: &str, _document: Value, _safe: bool) -> SinkResult<()> {
        Err(SinkError::NoDocumentStore {
            db: self.db.clone(),
        })
    }
}

impl DocumentStoreConnector for UnconfiguredStore {
    fn connect(&self, db: &str) -> Arc<dyn DocumentStore> {
        Arc::new(Unconfigured { db: db.to_string() })
    }
}

/// Process-local document store keyed by collection.
///
/// Clones share the same documents. It is its own connector, so one instance
/// can back every mongo sink of a context.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    collections: Arc<Mutex<HashMap<String, Vec<Value>>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents inserted into `collection`, oldest first.
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Names of collections that received at least one document.
    pub fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn insert(&self, collection: &str, document: Value, _safe: bool) -> SinkResult<()> {
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }
}

impl DocumentStoreConnector for MemoryDocumentStore {
    fn connect(&self, _db: &str) -> Arc<dyn DocumentStore> {
        Arc::new(self.clone())
    }
}

// ─── Sink ─────────────────────────────────────────────────────────────────────

/// Writes records as documents to a store.
pub struct DocumentSink {
    descriptor: SinkDescriptor,
    store: Arc<dyn DocumentStore>,
    collection: String,
    safe: bool,
    // Failures of spawned inserts are reported here, not by the sink set.
    deferred_failures: FailureLatch,
}

impl DocumentSink {
    /// Creates a sink writing to the collection derived from `file_tag`.
    pub fn new(
        level: Severity,
        db: &str,
        safe: bool,
        file_tag: &str,
        connector: &dyn DocumentStoreConnector,
    ) -> Self {
        let collection = collection_for(file_tag);
        trace!(sink = %format!("{db}{collection}"), "Connecting document sink");
        Self {
            descriptor: SinkDescriptor {
                kind: SinkKind::Mongo,
                level,
                params: SinkParams::Mongo {
                    db: db.to_string(),
                    collection: collection.clone(),
                    safe,
                },
            },
            store: connector.connect(db),
            collection,
            safe,
            deferred_failures: FailureLatch::new(),
        }
    }

    /// Target collection.
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

/// Collection name for a file tag.
pub fn collection_for(file_tag: &str) -> String {
    if file_tag.is_empty() {
        DEFAULT_COLLECTION.to_string()
    } else {
        file_tag.to_string()
    }
}

impl Sink for DocumentSink {
    fn descriptor(&self) -> &SinkDescriptor {
        &self.descriptor
    }

    fn write(&self, record: &Record) -> SinkResult<()> {
        let document = record.to_document();

        match Handle::try_current() {
            Ok(handle) => {
                let store = Arc::clone(&self.store);
                let collection = self.collection.clone();
                let safe = self.safe;
                let failures = self.deferred_failures.clone();
                handle.spawn(async move {
                    if let Err(e) = store.insert(&collection, document, safe).await {
                        failures.report(SinkKind::Mongo, &e);
                    }
                });
                Ok(())
            }
            Err(_) => {
                let insert = self.store.insert(&self.collection, document, self.safe);
                panic::catch_unwind(AssertUnwindSafe(|| futures::executor::block_on(insert)))
                    .unwrap_or_else(|_| {
                        Err(SinkError::store(
                            "document store panicked while inserting without a runtime",
                        ))
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_collection_from_tag() {
        assert_eq!(collection_for("orders"), "orders");
        assert_eq!(collection_for(""), DEFAULT_COLLECTION);
    }

    #[test]
    fn test_inline_insert_without_runtime() {
        let store = MemoryDocumentStore::new();
        let sink = DocumentSink::new(
            Severity::Debug,
            "mongodb://localhost:27017/Logs",
            true,
            "orders",
            &store,
        );
        sink.write(&Record::new("orders", Severity::Info, "created", None))
            .unwrap();

        let docs = store.documents("orders");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["message"], "created");
        assert_eq!(docs[0]["meta"]["app"], "orders");
    }

    #[test]
    fn test_unconfigured_store_fails_inline() {
        let sink = DocumentSink::new(
            Severity::Debug,
            "mongodb://localhost:27017/Logs",
            true,
            "",
            &UnconfiguredStore,
        );
        let err = sink
            .write(&Record::new("", Severity::Info, "lost", None))
            .unwrap_err();
        assert!(matches!(err, SinkError::NoDocumentStore { .. }));
    }

    struct RuntimeBound;

    #[async_trait]
    impl DocumentStore for RuntimeBound {
        async fn insert(&self, _collection: &str, _document: Value, _safe: bool) -> SinkResult<()> {
            // Needs the tokio timer, which only exists inside a runtime.
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(())
        }
    }

    impl DocumentStoreConnector for RuntimeBound {
        fn connect(&self, _db: &str) -> Arc<dyn DocumentStore> {
            Arc::new(RuntimeBound)
        }
    }

    #[test]
    fn test_inline_panic_becomes_error() {
        let sink = DocumentSink::new(
            Severity::Debug,
            "mongodb://localhost:27017/Logs",
            true,
            "jobs",
            &RuntimeBound,
        );
        let err = sink
            .write(&Record::new("jobs", Severity::Info, "x", None))
            .unwrap_err();
        assert!(matches!(err, SinkError::Store(_)));
    }

    #[tokio::test]
    async fn test_spawned_insert_with_runtime() {
        let store = MemoryDocumentStore::new();
        let sink = DocumentSink::new(
            Severity::Debug,
            "mongodb://localhost:27017/Logs",
            false,
            "",
            &store,
        );
        sink.write(&Record::new("", Severity::Alert, "async", None))
            .unwrap();

        for _ in 0..100 {
            if !store.documents(DEFAULT_COLLECTION).is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(store.documents(DEFAULT_COLLECTION).len(), 1);
        assert_eq!(store.collections(), vec![DEFAULT_COLLECTION.to_string()]);
    }

    #[tokio::test]
    async fn test_spawned_failure_is_latched() {
        let sink = DocumentSink::new(
            Severity::Debug,
            "mongodb://localhost:27017/Logs",
            true,
            "",
            &UnconfiguredStore,
        );
        assert!(sink.write(&Record::new("", Severity::Info, "x", None)).is_ok());

        for _ in 0..100 {
            if sink.deferred_failures.tripped() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(sink.deferred_failures.tripped());
    }
}
