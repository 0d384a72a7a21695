//! # Serialized Records
//!
//! Records travel as JSON objects. Literal fields map directly to values;
//! independent to-one relationships are resource URIs or null.

use crate::uri::extract_id;
use crate::{Error, Result};
use serde_json::{Map, Value};

/// A serialized API record: field name to JSON value.
pub type Record = Map<String, Value>;

/// Typed accessors over [`Record`].
pub trait RecordExt {
    /// The record's integer `id`.
    fn id(&self) -> Result<i64>;

    /// The record's own `resource_uri`.
    fn resource_uri(&self) -> Result<&str>;

    /// A string field, `None` when absent or null.
    fn str_field(&self, field: &str) -> Option<&str>;

    /// A string field that must be present.
    fn required_str(&self, field: &str) -> Result<&str>;

    /// A boolean field, `None` when absent or null.
    fn bool_field(&self, field: &str) -> Option<bool>;

    /// An integer field that must be present.
    fn required_i64(&self, field: &str) -> Result<i64>;

    /// The id of the record a relationship field points to.
    fn uri_id(&self, field: &str) -> Result<i64>;
}

impl RecordExt for Record {
    fn id(&self) -> Result<i64> {
        self.required_i64("id")
    }

    fn resource_uri(&self) -> Result<&str> {
        self.required_str("resource_uri")
    }

    fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    fn required_str(&self, field: &str) -> Result<&str> {
        self.str_field(field)
            .ok_or_else(|| Error::MissingField(field.to_string()))
    }

    fn bool_field(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    fn required_i64(&self, field: &str) -> Result<i64> {
        self.get(field)
            .and_then(Value::as_i64)
            .ok_or_else(|| Error::MissingField(field.to_string()))
    }

    fn uri_id(&self, field: &str) -> Result<i64> {
        extract_id(self.required_str(field)?)
    }
}

/// Build a [`Record`] from a `serde_json::json!` object literal.
///
/// Non-object values yield an empty record.
pub fn record_from(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}
