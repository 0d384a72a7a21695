//! # Record Sets
//!
//! Imported species are gathered into a named recordset so that collection
//! managers can review the load in the Specify UI.

use crate::{Record, RecordExt, ResourceStore, Result, record_from};
use serde_json::json;
use std::collections::BTreeSet;

/// Specify table id of `taxon`, from the Specify 6 table id listing.
pub const TAXON_TABLE_ID: i64 = 4;

/// Table holding record sets.
pub const RECORDSET_TABLE: &str = "recordset";

/// Table holding record set members.
pub const RECORDSET_ITEM_TABLE: &str = "recordsetitem";

/// Identity and ownership of a record set to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSetSpec {
    pub name: String,
    pub collection_id: i64,
    pub specify_user_uri: String,
    pub table_id: i64,
}

impl RecordSetSpec {
    /// A taxon record set owned by `specify_user_uri` in `collection_id`.
    pub fn taxa(name: impl Into<String>, collection_id: i64, specify_user_uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection_id,
            specify_user_uri: specify_user_uri.into(),
            table_id: TAXON_TABLE_ID,
        }
    }
}

/// Create the record set described by `spec` holding `record_ids`.
///
/// Each distinct id becomes one item, in the order it first appears. Rows
/// that resolve to the same species share one item rather than adding one
/// item per row. Returns the created record set.
pub async fn create_recordset<S: ResourceStore>(
    store: &S,
    spec: &RecordSetSpec,
    record_ids: &[i64],
) -> Result<Record> {
    let data = record_from(json!({
        "collectionmemberid": spec.collection_id,
        "dbtableid": spec.table_id,
        "name": spec.name,
        "type": 0,
        "version": 0,
        "specifyuser": spec.specify_user_uri,
    }));
    let recordset = store.create_resource(RECORDSET_TABLE, data).await?;
    let recordset_uri = recordset.resource_uri()?.to_string();

    let mut seen = BTreeSet::new();
    for &record_id in record_ids {
        if !seen.insert(record_id) {
            continue;
        }
        let item = record_from(json!({
            "recordid": record_id,
            "recordset": recordset_uri,
        }));
        store.create_resource(RECORDSET_ITEM_TABLE, item).await?;
    }

    Ok(recordset)
}
