//! # Taxon Tree Context
//!
//! Tree information every row needs: the tree definition, one definition
//! item per imported rank, and the anchor taxon the imported Orders hang
//! under. It is fetched once before any row is processed and does not change
//! for the rest of the run.

use crate::taxon::{create_accepted_taxon, find_taxon, get_def_item};
use crate::uri::api_link;
use crate::{Error, Rank, Record, RecordExt, ResourceStore, Result};
use std::collections::BTreeMap;

/// Table holding tree definitions.
pub const TREE_DEF_TABLE: &str = "taxontreedef";

// =============================================================================
// TREE DEFINITION ITEM
// =============================================================================

/// A `taxontreedefitem`: the definition of one level of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDefItem {
    pub id: i64,
    pub name: String,
    pub rank_id: i64,
    pub resource_uri: String,
}

impl TreeDefItem {
    /// Read the fields the import uses from a serialized item.
    pub fn from_record(record: &Record) -> Result<Self> {
        Ok(Self {
            id: record.id()?,
            name: record.required_str("name")?.to_string(),
            rank_id: record.required_i64("rankid")?,
            resource_uri: record.resource_uri()?.to_string(),
        })
    }
}

// =============================================================================
// ANCHOR
// =============================================================================

/// Where imported Orders attach.
///
/// The Class taxon `class_name` is the parent of every Order. When it does
/// not exist yet it is created under the Phylum taxon `phylum_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeAnchor {
    pub class_name: String,
    pub phylum_name: String,
}

impl Default for TreeAnchor {
    fn default() -> Self {
        Self {
            class_name: "Mammalia".to_string(),
            phylum_name: "Chordata".to_string(),
        }
    }
}

// =============================================================================
// TAXON TREE
// =============================================================================

/// Fetched tree context.
///
/// Holding a `TaxonTree` means the tree info is complete: every imported
/// rank has its definition item and the anchor taxon exists.
#[derive(Debug, Clone)]
pub struct TaxonTree {
    tree_def_id: i64,
    anchor: Record,
    def_items: BTreeMap<Rank, TreeDefItem>,
}

impl TaxonTree {
    /// Fetch the tree context of `discipline`, creating the anchor taxon if
    /// needed.
    pub async fn load<S: ResourceStore>(
        store: &S,
        discipline: &Record,
        anchor: &TreeAnchor,
        remarks: &str,
    ) -> Result<Self> {
        let tree_def_id = discipline.uri_id("taxontreedef")?;

        let class_item = get_def_item(store, tree_def_id, "Class").await?;
        let anchor_taxon = match find_taxon(store, &anchor.class_name, class_item.id, None).await? {
            Some(taxon) => taxon,
            None => {
                let phylum_item = get_def_item(store, tree_def_id, "Phylum").await?;
                let phylum = find_taxon(store, &anchor.phylum_name, phylum_item.id, None)
                    .await?
                    .ok_or_else(|| Error::MissingTaxon {
                        name: anchor.phylum_name.clone(),
                        rank: phylum_item.name.clone(),
                    })?;
                create_accepted_taxon(
                    store,
                    tree_def_id,
                    &class_item,
                    &anchor.class_name,
                    &phylum,
                    None,
                    remarks,
                )
                .await?
            }
        };

        let mut def_items = BTreeMap::new();
        for rank in Rank::ALL {
            let item = get_def_item(store, tree_def_id, rank.as_str()).await?;
            def_items.insert(rank, item);
        }

        Self::from_parts(tree_def_id, anchor_taxon, def_items)
    }

    /// Assemble a tree context from already fetched parts.
    ///
    /// Fails when any imported rank lacks a definition item.
    pub fn from_parts(
        tree_def_id: i64,
        anchor: Record,
        def_items: BTreeMap<Rank, TreeDefItem>,
    ) -> Result<Self> {
        anchor.resource_uri()?;
        if let Some(rank) = Rank::ALL.into_iter().find(|r| !def_items.contains_key(r)) {
            return Err(Error::MissingDefItem {
                rank: rank.to_string(),
                tree_def_id,
            });
        }
        Ok(Self {
            tree_def_id,
            anchor,
            def_items,
        })
    }

    /// Id of the `taxontreedef` record.
    pub fn tree_def_id(&self) -> i64 {
        self.tree_def_id
    }

    /// The taxon every imported Order is created under.
    pub fn anchor(&self) -> &Record {
        &self.anchor
    }

    /// Definition item of `rank`.
    pub fn def_item(&self, rank: Rank) -> &TreeDefItem {
        // from_parts rejects trees missing any rank
        &self.def_items[&rank]
    }

    /// Resource URI of the tree definition.
    pub fn definition_uri(&self) -> String {
        Self::definition_uri_for(self.tree_def_id)
    }

    pub(crate) fn definition_uri_for(tree_def_id: i64) -> String {
        api_link(TREE_DEF_TABLE, tree_def_id)
    }
}

