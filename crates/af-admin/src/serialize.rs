//! BSON to JSON rendering
//!
//! Stored records are loosely typed BSON documents; responses render them
//! as plain JSON with `_id` surfaced as `id` and datetimes as RFC 3339
//! strings.

use bson::{Bson, Document};
use serde_json::{Map, Value};

/// Render a stored record for a response body. `_id` becomes `id` and is
/// emitted first; remaining fields keep their stored order.
pub fn record_to_json(record: &Document) -> Value {
    let mut out = Map::new();
    if let Some(id) = record.get("_id") {
        out.insert("id".to_string(), bson_to_json(id));
    }
    for (key, value) in record {
        if key == "_id" {
            continue;
        }
        out.insert(key.clone(), bson_to_json(value));
    }
    Value::Object(out)
}

/// Convert one BSON value to JSON. Datetimes become RFC 3339 strings;
/// anything without a direct JSON counterpart falls back to relaxed
/// extended JSON.
pub fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Int32(n) => Value::from(*n),
        Bson::Int64(n) => Value::from(*n),
        Bson::Double(n) => Value::from(*n),
        Bson::DateTime(dt) => Value::String(
            dt.try_to_rfc3339_string()
                .unwrap_or_else(|_| dt.to_string()),
        ),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        Bson::Document(doc) => {
            let mut out = Map::new();
            for (key, value) in doc {
                out.insert(key.clone(), bson_to_json(value));
            }
            Value::Object(out)
        }
        other => other.clone().into_relaxed_extjson(),
    }
}

/// Read a datetime field as an RFC 3339 string, if present and a datetime.
pub fn datetime_field(record: &Document, field: &str) -> Option<String> {
    match record.get(field) {
        Some(Bson::DateTime(dt)) => dt.try_to_rfc3339_string().ok(),
        _ => None,
    }
}
