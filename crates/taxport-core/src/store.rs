//! # Resource Store
//!
//! The seam between the import rules and the remote database. Tables are
//! named by their lowercase API name and records are keyed by integer id.

use crate::{Record, Result};

// =============================================================================
// FILTER
// =============================================================================

/// Ordered `field=value` query pairs for a collection fetch.
///
/// A field of the form `relation__field` filters on `field` of the record
/// that `relation` points to, as in `parent__name=Felidae`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pairs: Vec<(String, String)>,
}

impl Filter {
    /// An empty filter matching every record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field` to equal `value`.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl ToString) -> Self {
        self.pairs.push((field.into(), value.to_string()));
        self
    }

    /// Require `field` to equal `value` when `value` is present.
    #[must_use]
    pub fn eq_opt(self, field: impl Into<String>, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.eq(field, value),
            None => self,
        }
    }

    /// The query pairs in insertion order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

// =============================================================================
// RESOURCESTORE TRAIT
// =============================================================================

/// Fetch, query, create and update records on named tables.
///
/// Calls are awaited one at a time; implementations need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait ResourceStore {
    /// Fetch the record `id` from `table`.
    async fn fetch_resource(&self, table: &str, id: i64) -> Result<Record>;

    /// Fetch the first page of `table` records matching `filter`.
    async fn fetch_collection(&self, table: &str, filter: &Filter) -> Result<Vec<Record>>;

    /// Create a record in `table` and return it as stored.
    async fn create_resource(&self, table: &str, data: Record) -> Result<Record>;

    /// Change only `fields` of record `id` in `table` and return the result.
    async fn update_resource(&self, table: &str, id: i64, fields: Record) -> Result<Record>;
}
