//! Firestore REST adapter.
//!
//! DESIGN
//! ======
//! Thin HTTP wrapper over the Firestore v1 REST surface:
//! - reads use `documents:runQuery` with a `structuredQuery`,
//! - writes use `documents:commit` so server timestamps can be requested as
//!   `REQUEST_TIME` transforms, with a `currentDocument.exists` precondition
//!   separating create (`false`) from partial update (`true`).
//!
//! Live queries poll `runQuery` at the configured interval and emit only when
//! the result set changed. Typed-value encoding and response parsing are pure
//! functions so they can be tested without a network.
//!
//! ERROR HANDLING
//! ==============
//! A failing poll emits one error item, then stays quiet until a poll
//! succeeds again, so a long outage does not flood subscribers.

#[cfg(test)]
#[path = "firestore_test.rs"]
mod firestore_test;

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt as _;
use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

use crate::config::FirestoreConfig;
use crate::net::query::{Filter, Query};
use crate::net::store::{Document, DocumentStore, DocumentWrite, SnapshotStream, StoreError};
use crate::util::ids::auto_id;

// =============================================================================
// CLIENT
// =============================================================================

/// Firestore-backed document store. Clones share one HTTP connection pool.
#[derive(Clone)]
pub struct FirestoreStore {
    http: reqwest::Client,
    base_url: String,
    database_path: String,
    api_key: Option<String>,
    poll_interval: Duration,
}

/// Whether a commit creates a new document or patches an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Create,
    Update,
}

impl FirestoreStore {
    /// Build a store client from typed config.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: &FirestoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| StoreError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            database_path: format!("projects/{}/databases/{}/documents", config.project_id, config.database),
            api_key: config.api_key.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}:{method}", self.base_url, self.database_path)
    }

    async fn post(&self, method: &str, body: &Value) -> Result<(u16, String), StoreError> {
        let mut request = self.http.post(self.endpoint(method)).json(body);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;
        Ok((status, text))
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        let body = json!({ "structuredQuery": structured_query(query) });
        let (status, text) = self.post("runQuery", &body).await?;
        if status != 200 {
            return Err(StoreError::Response { status, body: text });
        }
        parse_run_query_response(&text)
    }

    async fn commit(
        &self,
        collection: &str,
        id: &str,
        write: &DocumentWrite,
        mode: WriteMode,
    ) -> Result<(), StoreError> {
        let name = format!("{}/{collection}/{id}", self.database_path);
        let body = commit_body(&name, write, mode);
        let (status, text) = self.post("commit", &body).await?;
        match status {
            200 => Ok(()),
            404 if mode == WriteMode::Update => {
                Err(StoreError::NotFound { collection: collection.to_owned(), id: id.to_owned() })
            }
            _ => Err(StoreError::Response { status, body: text }),
        }
    }
}

struct PollState {
    store: FirestoreStore,
    query: Query,
    last: Option<Vec<Document>>,
    polled: bool,
    failing: bool,
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.run_query(query).await
    }

    async fn create(&self, collection: &str, write: DocumentWrite) -> Result<String, StoreError> {
        let id = auto_id();
        self.commit(collection, &id, &write, WriteMode::Create).await?;
        debug!(%collection, %id, "firestore: document created");
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, write: DocumentWrite) -> Result<(), StoreError> {
        self.commit(collection, id, &write, WriteMode::Update).await?;
        debug!(%collection, %id, "firestore: document updated");
        Ok(())
    }

    fn watch(&self, query: Query) -> SnapshotStream {
        let state = PollState { store: self.clone(), query, last: None, polled: false, failing: false };
        futures::stream::unfold(state, |mut state| async move {
            loop {
                if state.polled {
                    tokio::time::sleep(state.store.poll_interval).await;
                }
                state.polled = true;
                match state.store.run_query(&state.query).await {
                    Ok(docs) => {
                        state.failing = false;
                        if state.last.as_ref() != Some(&docs) {
                            state.last = Some(docs.clone());
                            return Some((Ok(docs), state));
                        }
                    }
                    Err(err) if !state.failing => {
                        state.failing = true;
                        return Some((Err(err), state));
                    }
                    Err(err) => {
                        warn!(collection = %state.query.collection, error = %err, "firestore: poll still failing");
                    }
                }
            }
        })
        .boxed()
    }
}

// =============================================================================
// QUERY ENCODING
// =============================================================================

/// Encode a [`Query`] as a Firestore `structuredQuery` object.
pub(crate) fn structured_query(query: &Query) -> Value {
    let mut out = Map::new();
    out.insert("from".to_owned(), json!([{ "collectionId": query.collection }]));

    let mut filters = query.filters.iter().map(field_filter).collect::<Vec<_>>();
    match filters.len() {
        0 => {}
        1 => {
            out.insert("where".to_owned(), filters.remove(0));
        }
        _ => {
            out.insert("where".to_owned(), json!({ "compositeFilter": { "op": "AND", "filters": filters } }));
        }
    }

    if let Some(field) = &query.order_by {
        out.insert(
            "orderBy".to_owned(),
            json!([{ "field": { "fieldPath": field }, "direction": "ASCENDING" }]),
        );
    }
    Value::Object(out)
}

fn field_filter(filter: &Filter) -> Value {
    let (field, op, value) = match filter {
        Filter::Eq { field, value } => (field, "EQUAL", encode_value(value)),
        Filter::In { field, values } => (field, "IN", encode_value(&Value::Array(values.clone()))),
    };
    json!({ "fieldFilter": { "field": { "fieldPath": field }, "op": op, "value": value } })
}

// =============================================================================
// WRITE ENCODING
// =============================================================================

/// Build a `documents:commit` request body for a single document write.
fn commit_body(name: &str, write: &DocumentWrite, mode: WriteMode) -> Value {
    let mut entry = Map::new();
    entry.insert("update".to_owned(), json!({ "name": name, "fields": encode_fields(&write.fields) }));

    if mode == WriteMode::Update {
        let paths = write.fields.keys().cloned().collect::<Vec<_>>();
        entry.insert("updateMask".to_owned(), json!({ "fieldPaths": paths }));
    }

    if !write.server_timestamps.is_empty() {
        let transforms = write
            .server_timestamps
            .iter()
            .map(|field| json!({ "fieldPath": field, "setToServerValue": "REQUEST_TIME" }))
            .collect::<Vec<_>>();
        entry.insert("updateTransforms".to_owned(), Value::Array(transforms));
    }

    entry.insert(
        "currentDocument".to_owned(),
        json!({ "exists": mode == WriteMode::Update }),
    );
    json!({ "writes": [Value::Object(entry)] })
}

// =============================================================================
// TYPED VALUES
// =============================================================================

fn encode_fields(fields: &Map<String, Value>) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

/// Encode plain JSON as a Firestore typed value.
pub(crate) fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(v) => json!({ "booleanValue": v }),
        Value::Number(n) => match n.as_i64() {
            Some(int) => json!({ "integerValue": int.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or(0.0) }),
        },
        Value::String(v) => json!({ "stringValue": v }),
        Value::Array(items) => {
            let values = items.iter().map(encode_value).collect::<Vec<_>>();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

/// Decode a Firestore typed value into plain JSON.
///
/// Timestamps become milliseconds since the Unix epoch; unknown value kinds
/// decode to `null`.
pub(crate) fn decode_value(value: &Value) -> Value {
    let Some(object) = value.as_object() else {
        return Value::Null;
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Value::Null;
    };
    match kind.as_str() {
        "booleanValue" => inner.as_bool().map_or(Value::Null, Value::Bool),
        "integerValue" => match inner {
            Value::String(s) => s.parse::<i64>().map_or(Value::Null, Value::from),
            Value::Number(n) => Value::Number(n.clone()),
            _ => Value::Null,
        },
        "doubleValue" => inner
            .as_f64()
            .and_then(serde_json::Number::from_f64)
            .map_or(Value::Null, Value::Number),
        "timestampValue" => inner
            .as_str()
            .and_then(parse_timestamp_millis)
            .map_or(Value::Null, Value::from),
        "stringValue" | "referenceValue" | "bytesValue" => inner.as_str().map_or(Value::Null, Value::from),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|items| items.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(decode_fields(inner.get("fields"))),
        "geoPointValue" => inner.clone(),
        _ => Value::Null,
    }
}

fn decode_fields(fields: Option<&Value>) -> Map<String, Value> {
    fields
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .map(|(k, v)| (k.clone(), decode_value(v)))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse an RFC 3339 timestamp into milliseconds since the Unix epoch.
pub(crate) fn parse_timestamp_millis(raw: &str) -> Option<i64> {
    let parsed = OffsetDateTime::parse(raw, &Rfc3339).ok()?;
    i64::try_from(parsed.unix_timestamp_nanos() / 1_000_000).ok()
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

/// Decode a Firestore document resource (`name` + `fields`).
fn decode_document(resource: &Value) -> Result<Document, StoreError> {
    let name = resource
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Parse("document without name".to_owned()))?;
    let id = name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StoreError::Parse(format!("malformed document name: {name}")))?;
    Ok(Document::new(id, decode_fields(resource.get("fields"))))
}

/// Parse a `runQuery` response body. Result entries without a document
/// (progress markers, empty results) are skipped.
pub(crate) fn parse_run_query_response(body: &str) -> Result<Vec<Document>, StoreError> {
    let entries: Vec<Value> = serde_json::from_str(body).map_err(|e| StoreError::Parse(e.to_string()))?;
    entries
        .iter()
        .filter_map(|entry| entry.get("document"))
        .map(decode_document)
        .collect()
}
