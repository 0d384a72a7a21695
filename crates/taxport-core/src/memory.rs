//! # In-Memory Store
//!
//! A [`ResourceStore`] over in-process tables. It follows the remote
//! semantics the import relies on:
//!
//! - created records get an `id`, a `resource_uri` and a `version`;
//! - updates change only the given fields and bump `version`;
//! - filters compare plain fields by value, URI-valued fields by the id they
//!   point to, and `relation__field` through the related record.
//!
//! Every call is logged in order, so a test can check the exact chain of
//! requests a row produces.

use crate::uri::{api_link, parse_uri};
use crate::{Error, Filter, Record, RecordExt, ResourceStore, Result};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use thiserror::Error;

type Tables = BTreeMap<String, BTreeMap<i64, Record>>;

/// Failures specific to [`MemoryStore`].
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("No {table} record with id {id}")]
    NotFound { table: String, id: i64 },
}

/// One call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Fetch { table: String, id: i64 },
    Query { table: String, filter: Vec<(String, String)> },
    Create { table: String },
    Update { table: String, id: i64, fields: Vec<String> },
}

impl Call {
    /// Table the call targeted.
    pub fn table(&self) -> &str {
        match self {
            Call::Fetch { table, .. }
            | Call::Query { table, .. }
            | Call::Create { table }
            | Call::Update { table, .. } => table,
        }
    }
}

/// Single-threaded in-memory record store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RefCell<Tables>,
    last_id: Cell<i64>,
    calls: RefCell<Vec<Call>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `data` in `table` without logging a call. Returns the stored record.
    pub fn insert(&self, table: &str, data: Record) -> Record {
        let id = self.last_id.get().saturating_add(1);
        self.last_id.set(id);

        let mut record = data;
        record.insert("id".into(), Value::from(id));
        record.insert("resource_uri".into(), Value::from(api_link(table, id)));
        record.entry("version").or_insert(Value::from(0));

        self.tables
            .borrow_mut()
            .entry(table.to_lowercase())
            .or_default()
            .insert(id, record.clone());
        record
    }

    /// Current state of record `id` in `table`.
    pub fn get(&self, table: &str, id: i64) -> Option<Record> {
        self.tables
            .borrow()
            .get(&table.to_lowercase())
            .and_then(|rows| rows.get(&id))
            .cloned()
    }

    /// All records of `table`, by ascending id.
    pub fn records(&self, table: &str) -> Vec<Record> {
        self.tables
            .borrow()
            .get(&table.to_lowercase())
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Calls made so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Forget the call log.
    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    fn log(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn not_found(table: &str, id: i64) -> Error {
        Error::store(MemoryError::NotFound {
            table: table.to_string(),
            id,
        })
    }
}

impl ResourceStore for MemoryStore {
    async fn fetch_resource(&self, table: &str, id: i64) -> Result<Record> {
        self.log(Call::Fetch {
            table: table.to_lowercase(),
            id,
        });
        self.get(table, id).ok_or_else(|| Self::not_found(table, id))
    }

    async fn fetch_collection(&self, table: &str, filter: &Filter) -> Result<Vec<Record>> {
        self.log(Call::Query {
            table: table.to_lowercase(),
            filter: filter.pairs().to_vec(),
        });
        let tables = self.tables.borrow();
        let Some(rows) = tables.get(&table.to_lowercase()) else {
            return Ok(Vec::new());
        };
        Ok(rows
            .values()
            .filter(|record| {
                filter
                    .pairs()
                    .iter()
                    .all(|(field, value)| field_matches(&tables, record, field, value))
            })
            .cloned()
            .collect())
    }

    async fn create_resource(&self, table: &str, data: Record) -> Result<Record> {
        self.log(Call::Create {
            table: table.to_lowercase(),
        });
        Ok(self.insert(table, data))
    }

    async fn update_resource(&self, table: &str, id: i64, fields: Record) -> Result<Record> {
        self.log(Call::Update {
            table: table.to_lowercase(),
            id,
            fields: fields.keys().cloned().collect(),
        });

        let mut tables = self.tables.borrow_mut();
        let record = tables
            .get_mut(&table.to_lowercase())
            .and_then(|rows| rows.get_mut(&id))
            .ok_or_else(|| Self::not_found(table, id))?;

        let version = record.required_i64("version").unwrap_or(0);
        for (field, value) in fields {
            record.insert(field, value);
        }
        record.insert("version".into(), Value::from(version.saturating_add(1)));
        Ok(record.clone())
    }
}

fn field_matches(tables: &Tables, record: &Record, field: &str, expected: &str) -> bool {
    if let Some((relation, rest)) = field.split_once("__") {
        let Some(uri) = record.str_field(relation) else {
            return false;
        };
        let Ok((table, Some(id))) = parse_uri(uri) else {
            return false;
        };
        return tables
            .get(&table)
            .and_then(|rows| rows.get(&id))
            .is_some_and(|related| field_matches(tables, related, rest, expected));
    }

    match record.get(field) {
        Some(Value::String(s)) => {
            s == expected
                || matches!(parse_uri(s), Ok((_, Some(id))) if id.to_string() == expected)
        }
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        _ => false,
    }
}
