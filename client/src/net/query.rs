//! Portable query model for live and one-shot store reads.
//!
//! DESIGN
//! ======
//! The chat layer needs only conjunctive equality/membership filters and an
//! ascending sort, so the model stops there. Backends either translate a
//! [`Query`] into their native form (Firestore `structuredQuery`) or evaluate
//! it locally with [`Query::apply`] (in-memory store).
//!
//! Ordering follows the document database convention: missing and null
//! values sort first, then booleans, numbers, strings, and everything else.

#[cfg(test)]
#[path = "query_test.rs"]
mod query_test;

use std::cmp::Ordering;

use serde_json::Value;

use crate::net::store::Document;

/// A single field predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals value.
    Eq { field: String, value: Value },
    /// Field equals one of the values.
    In { field: String, values: Vec<Value> },
}

impl Filter {
    fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::Eq { field, value } => doc.get(field) == Some(value),
            Self::In { field, values } => doc.get(field).is_some_and(|v| values.contains(v)),
        }
    }
}

/// Collection query: all filters must match, results optionally sorted.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    /// Field to sort ascending by.
    pub order_by: Option<String>,
}

impl Query {
    /// Every document of `collection`, in store order.
    #[must_use]
    pub fn collection(name: &str) -> Self {
        Self { collection: name.to_owned(), filters: Vec::new(), order_by: None }
    }

    #[must_use]
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq { field: field.to_owned(), value: value.into() });
        self
    }

    #[must_use]
    pub fn where_in<I, V>(mut self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values = values.into_iter().map(Into::into).collect();
        self.filters.push(Filter::In { field: field.to_owned(), values });
        self
    }

    #[must_use]
    pub fn order_by_asc(mut self, field: &str) -> Self {
        self.order_by = Some(field.to_owned());
        self
    }

    /// Whether `doc` satisfies every filter.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.filters.iter().all(|filter| filter.matches(doc))
    }

    /// Filter and sort `docs` locally. The sort is stable, so ties keep
    /// their input order.
    #[must_use]
    pub fn apply<I>(&self, docs: I) -> Vec<Document>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut out = docs
            .into_iter()
            .filter(|doc| self.matches(doc))
            .collect::<Vec<_>>();
        if let Some(field) = &self.order_by {
            out.sort_by(|a, b| compare_values(a.get(field), b.get(field)));
        }
        out
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Object(_)) => 5,
    }
}

/// Total order over optional JSON values used for sorting.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
