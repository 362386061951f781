//! Query model: equality/range/"in" filters, one sort key, limit and
//! start-after cursors.

use std::cmp::Ordering;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::document::{Document, field};

/// Filter operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    Eq,
    In,
    Lt,
    Le,
    Gt,
    Ge,
}

/// One field predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: JsonValue,
}

impl Filter {
    pub fn matches(&self, data: &JsonValue) -> bool {
        let Some(actual) = field(data, &self.field) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::In => self
                .value
                .as_array()
                .is_some_and(|candidates| candidates.contains(actual)),
            FilterOp::Lt => cmp_json(actual, &self.value) == Ordering::Less,
            FilterOp::Le => cmp_json(actual, &self.value) != Ordering::Greater,
            FilterOp::Gt => cmp_json(actual, &self.value) == Ordering::Greater,
            FilterOp::Ge => cmp_json(actual, &self.value) != Ordering::Less,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDir {
    Asc,
    Desc,
}

/// The single sort key a query may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub dir: SortDir,
}

/// Opaque paging marker: the sort-field value of the last-seen document plus
/// its id as tiebreak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub sort_value: JsonValue,
    pub id: String,
}

/// A store query: collection + filters + optional sort + limit + cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<Filter>,
    pub sort: Option<SortKey>,
    pub limit: Option<usize>,
    pub start_after: Option<Cursor>,
}

impl Query {
    pub fn collection(name: impl Into<String>) -> Self {
        Self {
            collection: name.into(),
            filters: Vec::new(),
            sort: None,
            limit: None,
            start_after: None,
        }
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: JsonValue) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            op,
            value,
        });
        self
    }

    pub fn filter_eq(self, field: impl Into<String>, value: JsonValue) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn sort_asc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(SortKey {
            field: field.into(),
            dir: SortDir::Asc,
        });
        self
    }

    pub fn sort_desc(mut self, field: impl Into<String>) -> Self {
        self.sort = Some(SortKey {
            field: field.into(),
            dir: SortDir::Desc,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_after(mut self, cursor: Option<Cursor>) -> Self {
        self.start_after = cursor;
        self
    }

    pub fn matches(&self, data: &JsonValue) -> bool {
        self.filters.iter().all(|f| f.matches(data))
    }

    /// The distinct fields this query constrains (filters + sort key). More
    /// than one distinct field requires a registered composite index.
    pub fn constrained_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = self.filters.iter().map(|f| f.field.clone()).collect();
        if let Some(sort) = &self.sort {
            fields.push(sort.field.clone());
        }
        fields.sort();
        fields.dedup();
        fields
    }

    /// Cursor pointing after the given document under this query's sort.
    pub fn cursor_after(&self, doc: &Document) -> Cursor {
        let sort_value = self
            .sort
            .as_ref()
            .and_then(|s| field(&doc.data, &s.field).cloned())
            .unwrap_or(JsonValue::Null);
        Cursor {
            sort_value,
            id: doc.id.clone(),
        }
    }
}

/// Total order over JSON scalars used for range filters and sorting.
///
/// Strings that both parse as RFC3339 timestamps compare as instants, not
/// lexically (chrono emits variable subsecond precision, which breaks plain
/// string ordering within a second).
pub fn cmp_json(a: &JsonValue, b: &JsonValue) -> Ordering {
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => Ordering::Equal,
        (JsonValue::Null, _) => Ordering::Less,
        (_, JsonValue::Null) => Ordering::Greater,
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (JsonValue::String(x), JsonValue::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(tx), Ok(ty)) => tx.cmp(&ty),
                _ => x.cmp(y),
            }
        }
        // Mixed scalar kinds: order by a fixed kind rank so the sort is total.
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(v: &JsonValue) -> u8 {
    match v {
        JsonValue::Null => 0,
        JsonValue::Bool(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::String(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}
