//! # Taxon Lookups
//!
//! Query and write helpers shared by tree loading and row resolution.

use crate::tree::{TaxonTree, TreeDefItem};
use crate::{Error, Filter, Record, RecordExt, ResourceStore, Result, record_from};
use serde_json::{Value, json};

/// Table holding taxon records.
pub const TAXON_TABLE: &str = "taxon";

/// Table holding tree definition items.
pub const DEF_ITEM_TABLE: &str = "taxontreedefitem";

/// Return the tree definition item named `rank_name` in tree `tree_def_id`.
pub async fn get_def_item<S: ResourceStore>(
    store: &S,
    tree_def_id: i64,
    rank_name: &str,
) -> Result<TreeDefItem> {
    let filter = Filter::new().eq("name", rank_name).eq("treedef", tree_def_id);
    let items = store.fetch_collection(DEF_ITEM_TABLE, &filter).await?;
    let first = items.into_iter().next().ok_or_else(|| Error::MissingDefItem {
        rank: rank_name.to_string(),
        tree_def_id,
    })?;
    TreeDefItem::from_record(&first)
}

/// Return the first taxon named `name` at `def_item_id`, optionally
/// restricted to children of a taxon named `parent_name`.
pub async fn find_taxon<S: ResourceStore>(
    store: &S,
    name: &str,
    def_item_id: i64,
    parent_name: Option<&str>,
) -> Result<Option<Record>> {
    let filter = Filter::new()
        .eq("name", name)
        .eq("definitionitem", def_item_id)
        .eq_opt("parent__name", parent_name);
    let taxa = store.fetch_collection(TAXON_TABLE, &filter).await?;
    Ok(taxa.into_iter().next())
}

/// Set the author of `taxon`, skipping the write when it already matches.
///
/// Returns the current taxon and whether it was written.
pub async fn update_author<S: ResourceStore>(
    store: &S,
    taxon: Record,
    author: Option<&str>,
) -> Result<(Record, bool)> {
    if taxon.str_field("author") == author {
        return Ok((taxon, false));
    }
    let mut fields = Record::new();
    fields.insert("author".into(), author.map_or(Value::Null, Value::from));
    let updated = store.update_resource(TAXON_TABLE, taxon.id()?, fields).await?;
    Ok((updated, true))
}

/// Create an accepted, non-hybrid taxon named `name` under `parent`.
pub async fn create_accepted_taxon<S: ResourceStore>(
    store: &S,
    tree_def_id: i64,
    def_item: &TreeDefItem,
    name: &str,
    parent: &Record,
    author: Option<&str>,
    remarks: &str,
) -> Result<Record> {
    let data = taxon_data(
        tree_def_id,
        def_item,
        name,
        parent,
        author,
        TaxonStatus::Accepted,
        remarks,
    )?;
    store.create_resource(TAXON_TABLE, data).await
}

/// Acceptance of a taxon about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TaxonStatus {
    Accepted,
    SynonymOf(Option<String>),
}

/// Serialize a new taxon. The backend derives `fullname` on save.
pub(crate) fn taxon_data(
    tree_def_id: i64,
    def_item: &TreeDefItem,
    name: &str,
    parent: &Record,
    author: Option<&str>,
    status: TaxonStatus,
    remarks: &str,
) -> Result<Record> {
    let (is_accepted, accepted_taxon) = match status {
        TaxonStatus::Accepted => (true, None),
        TaxonStatus::SynonymOf(uri) => (false, uri),
    };
    let value = json!({
        "name": name,
        "author": author,
        "acceptedtaxon": accepted_taxon,
        "isaccepted": is_accepted,
        "ishybrid": false,
        "rankid": def_item.rank_id,
        "version": 0,
        "remarks": remarks,
        "definition": TaxonTree::definition_uri_for(tree_def_id),
        "definitionitem": def_item.resource_uri,
        "parent": parent.resource_uri()?,
    });
    Ok(record_from(value))
}
