//! Document store seam used by the synchronization layer.
//!
//! ARCHITECTURE
//! ============
//! The chat service never talks to a backend directly; it holds an
//! `Arc<dyn DocumentStore>`. Backends provide one-shot queries, document
//! creation, partial updates and live queries. Live queries are plain
//! streams of full result sets so the service can republish each snapshot
//! without diffing.
//!
//! Server timestamps are requested through [`DocumentWrite::server_timestamp`]
//! and filled in by the backend with its own clock.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::{Map, Value};

use crate::net::query::Query;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by document store backends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend cannot be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A partial update targeted a document that does not exist.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// The HTTP request to the backend failed before a response arrived.
    #[error("store request failed: {0}")]
    Request(String),

    /// The backend returned a non-success HTTP status.
    #[error("store response error: status {status}")]
    Response { status: u16, body: String },

    /// The backend response could not be decoded.
    #[error("store response parse failed: {0}")]
    Parse(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

// =============================================================================
// DOCUMENTS
// =============================================================================

/// A stored document: identifier plus JSON fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl Document {
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self { id: id.into(), fields }
    }

    /// Field value by name.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Fields as a JSON object with the document id under `"id"`.
    ///
    /// The document id wins over a stored field of the same name.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("id".to_owned(), Value::String(self.id.clone()));
        Value::Object(object)
    }
}

/// Field assignments for a create or partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentWrite {
    /// Literal field values.
    pub fields: Map<String, Value>,
    /// Fields the backend sets to its own current time.
    pub server_timestamps: Vec<String>,
}

impl DocumentWrite {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a literal value to `field`.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.server_timestamps.retain(|f| f != field);
        self.fields.insert(field.to_owned(), value.into());
        self
    }

    /// Ask the backend to stamp `field` with its current time.
    #[must_use]
    pub fn server_timestamp(mut self, field: &str) -> Self {
        self.fields.remove(field);
        if !self.server_timestamps.iter().any(|f| f == field) {
            self.server_timestamps.push(field.to_owned());
        }
        self
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Live query stream: one full result set per change, first item is current.
pub type SnapshotStream = BoxStream<'static, Result<Vec<Document>, StoreError>>;

/// Backend-neutral document store. Enables mocking in tests.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a one-shot query.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the backend cannot answer.
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Create a document in `collection` and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the write is rejected or cannot be sent.
    async fn create(&self, collection: &str, write: DocumentWrite) -> Result<String, StoreError>;

    /// Merge `write` into an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown ids and other variants
    /// when the write cannot be sent.
    async fn update(&self, collection: &str, id: &str, write: DocumentWrite) -> Result<(), StoreError>;

    /// Subscribe to a live query.
    fn watch(&self, query: Query) -> SnapshotStream;
}
