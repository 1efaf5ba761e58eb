//! In-process document store.
//!
//! DESIGN
//! ======
//! Collections are insertion-ordered vectors behind a mutex. Every write bumps
//! a revision counter published through `tokio::sync::watch`; live queries
//! wait on that counter, re-run their query and emit only when the result set
//! differs from the last one they sent. Server timestamps come from a clock
//! that never repeats a value, so ordering by timestamp is total.

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures::StreamExt as _;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::net::query::Query;
use crate::net::store::{Document, DocumentStore, DocumentWrite, SnapshotStream, StoreError};
use crate::util::clock::now_millis;
use crate::util::ids::auto_id;

/// Document store living entirely in process memory. Clones share data.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    revision: watch::Sender<u64>,
    last_stamp: AtomicI64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(HashMap::new()),
                revision,
                last_stamp: AtomicI64::new(0),
            }),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Document>>> {
        self.collections.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self, query: &Query) -> Vec<Document> {
        let docs = self
            .lock()
            .get(&query.collection)
            .cloned()
            .unwrap_or_default();
        query.apply(docs)
    }

    /// Strictly increasing millisecond stamp.
    fn stamp(&self) -> i64 {
        let now = now_millis();
        let mut prev = self.last_stamp.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last_stamp
                .compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    fn apply_write(&self, doc: &mut Document, write: DocumentWrite) {
        for (field, value) in write.fields {
            doc.fields.insert(field, value);
        }
        for field in write.server_timestamps {
            doc.fields.insert(field, Value::from(self.stamp()));
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

struct WatchState {
    inner: Arc<Inner>,
    revisions: watch::Receiver<u64>,
    query: Query,
    last: Option<Vec<Document>>,
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        Ok(self.inner.snapshot(query))
    }

    async fn create(&self, collection: &str, write: DocumentWrite) -> Result<String, StoreError> {
        let id = auto_id();
        let mut doc = Document::new(id.clone(), serde_json::Map::new());
        self.inner.apply_write(&mut doc, write);
        self.inner
            .lock()
            .entry(collection.to_owned())
            .or_default()
            .push(doc);
        self.inner.bump();
        debug!(%collection, %id, "memory store: document created");
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, write: DocumentWrite) -> Result<(), StoreError> {
        {
            let mut collections = self.inner.lock();
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
                .ok_or_else(|| StoreError::NotFound { collection: collection.to_owned(), id: id.to_owned() })?;
            self.inner.apply_write(doc, write);
        }
        self.inner.bump();
        debug!(%collection, %id, "memory store: document updated");
        Ok(())
    }

    fn watch(&self, query: Query) -> SnapshotStream {
        let state = WatchState {
            inner: Arc::clone(&self.inner),
            revisions: self.inner.revision.subscribe(),
            query,
            last: None,
        };
        futures::stream::unfold(state, |mut state| async move {
            loop {
                state.revisions.borrow_and_update();
                let snapshot = state.inner.snapshot(&state.query);
                if state.last.as_ref() != Some(&snapshot) {
                    state.last = Some(snapshot.clone());
                    return Some((Ok(snapshot), state));
                }
                if state.revisions.changed().await.is_err() {
                    return None;
                }
            }
        })
        .boxed()
    }
}
