use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::{StoreError, StoreResult};

/// A stored JSON document plus its store-assigned metadata.
///
/// `revision` increases monotonically on every write to this document and is
/// what transaction commit validation compares against.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub revision: u64,
    pub data: JsonValue,
}

impl Document {
    /// Deserialize the document body into a typed record.
    pub fn to_typed<T: DeserializeOwned>(&self) -> StoreResult<T> {
        serde_json::from_value(self.data.clone()).map_err(StoreError::from)
    }
}

/// Serialize a typed record into a document body, taking the id from its
/// `id` field when present.
pub fn to_document_data<T: Serialize>(value: &T) -> StoreResult<JsonValue> {
    serde_json::to_value(value).map_err(StoreError::from)
}

/// Look up a (possibly dotted) field path inside a document body.
pub fn field<'v>(data: &'v JsonValue, path: &str) -> Option<&'v JsonValue> {
    let mut current = data;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_paths_traverse_nested_objects() {
        let data = json!({"status": {"location": "EN_CLIENTE"}, "code": "KEG-001"});
        assert_eq!(field(&data, "code"), Some(&json!("KEG-001")));
        assert_eq!(field(&data, "status.location"), Some(&json!("EN_CLIENTE")));
        assert_eq!(field(&data, "status.missing"), None);
        assert_eq!(field(&data, "code.nested"), None);
    }
}
