//! # Taxon Resolver
//!
//! Walks one CSV row down the rank chain, fetching or creating each taxon,
//! and reconciles the accepted/synonym rule at the Species rank:
//!
//! - an accepted row leaves the species accepted with no accepted taxon;
//! - a synonym row points the species at `AcceptedGenus AcceptedSpecies`,
//!   creating that accepted species (and its genus, under the holding family
//!   "Uploaded") when it does not exist;
//! - an existing accepted species named by a synonym row is synonymized.
//!
//! Authors are only managed at the Species rank. Resolution is idempotent:
//! re-running a row that was already imported issues only lookups.

use crate::taxon::{TAXON_TABLE, TaxonStatus, create_accepted_taxon, find_taxon, taxon_data, update_author};
use crate::{Error, Rank, Record, RecordExt, ResourceStore, Result, TaxonRow, TaxonTree};
use serde::Serialize;
use serde_json::Value;

/// Name of the Order and Family that hold accepted genera created on demand.
pub const HOLDING_TAXON_NAME: &str = "Uploaded";

/// Default `remarks` written on created taxa.
pub const DEFAULT_REMARKS: &str = "Generated by taxport";

// =============================================================================
// OUTCOMES
// =============================================================================

/// What resolution did to the taxon at one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonAction {
    /// Existing taxon used as is.
    Fetched,
    /// Existing taxon whose author was changed.
    AuthorUpdated,
    /// Existing accepted taxon turned into a synonym.
    Synonymized,
    /// New taxon created.
    Created,
}

/// Result of resolving one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    /// Id of the Species-rank taxon the row resolved to.
    pub species_id: i64,
    /// Action taken at each rank, parent first.
    pub actions: Vec<(Rank, TaxonAction)>,
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Resolves CSV rows against a store, given the fetched tree context.
pub struct TaxonResolver<'a, S> {
    store: &'a S,
    tree: &'a TaxonTree,
    remarks: String,
}

impl<'a, S: ResourceStore> TaxonResolver<'a, S> {
    pub fn new(store: &'a S, tree: &'a TaxonTree) -> Self {
        Self {
            store,
            tree,
            remarks: DEFAULT_REMARKS.to_string(),
        }
    }

    /// Use `remarks` on every taxon this resolver creates.
    #[must_use]
    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    /// Resolve every rank of `row`, returning the Species taxon id.
    ///
    /// The anchor taxon is the parent of the Order; each resolved taxon is
    /// the parent of the next rank.
    pub async fn process_row(&self, row: &TaxonRow) -> Result<RowOutcome> {
        let mut parent = self.tree.anchor().clone();
        let mut actions = Vec::with_capacity(Rank::ALL.len());

        for rank in Rank::ALL {
            let (taxon, action) = self.get_or_create_taxon(row, rank, &parent).await?;
            actions.push((rank, action));
            parent = taxon;
        }

        Ok(RowOutcome {
            species_id: parent.id()?,
            actions,
        })
    }

    /// Fetch the taxon `row` names at `rank` under `parent`, bringing it in
    /// line with the row, or create it.
    pub async fn get_or_create_taxon(
        &self,
        row: &TaxonRow,
        rank: Rank,
        parent: &Record,
    ) -> Result<(Record, TaxonAction)> {
        let def_item = self.tree.def_item(rank);
        let name = row.name_at(rank);
        let existing = find_taxon(self.store, name, def_item.id, parent.str_field("name")).await?;

        let author = if rank.is_leaf() {
            row.author.as_deref()
        } else {
            None
        };

        if let Some(mut taxon) = existing {
            if !rank.is_leaf() {
                return Ok((taxon, TaxonAction::Fetched));
            }

            let mut action = TaxonAction::Fetched;
            if taxon.bool_field("isaccepted") == Some(true) && !row.is_accepted() {
                taxon = self.synonymize(row, &taxon).await?;
                action = TaxonAction::Synonymized;
            }
            let (taxon, author_written) = update_author(self.store, taxon, author).await?;
            if author_written && action == TaxonAction::Fetched {
                action = TaxonAction::AuthorUpdated;
            }
            return Ok((taxon, action));
        }

        let status = if rank.is_leaf() && !row.is_accepted() {
            TaxonStatus::SynonymOf(self.accepted_uri(row).await?)
        } else {
            TaxonStatus::Accepted
        };
        let data = taxon_data(
            self.tree.tree_def_id(),
            def_item,
            name,
            parent,
            author,
            status,
            &self.remarks,
        )?;
        let taxon = self.store.create_resource(TAXON_TABLE, data).await?;
        Ok((taxon, TaxonAction::Created))
    }

    /// Resource URI of the accepted taxon a synonym row points to.
    ///
    /// `None` for accepted rows. The accepted species is looked up under
    /// `AcceptedGenus`; its author is updated when found and it is created
    /// otherwise.
    pub async fn accepted_uri(&self, row: &TaxonRow) -> Result<Option<String>> {
        if row.is_accepted() {
            return Ok(None);
        }

        let accepted_author = row.accepted_author.as_deref();
        let species_item = self.tree.def_item(Rank::Species);

        let existing = find_taxon(
            self.store,
            &row.accepted_species,
            species_item.id,
            Some(&row.accepted_genus),
        )
        .await?;
        if let Some(accepted) = existing {
            let (updated, _) = update_author(self.store, accepted, accepted_author).await?;
            return Ok(Some(updated.resource_uri()?.to_string()));
        }

        let genus = self.accepted_genus(row).await?;
        let species = create_accepted_taxon(
            self.store,
            self.tree.tree_def_id(),
            species_item,
            &row.accepted_species,
            &genus,
            accepted_author,
            &self.remarks,
        )
        .await?;
        Ok(Some(species.resource_uri()?.to_string()))
    }

    /// Mark `taxon` as a synonym of the row's accepted species.
    pub async fn synonymize(&self, row: &TaxonRow, taxon: &Record) -> Result<Record> {
        let accepted = self.accepted_uri(row).await?;

        let mut fields = Record::new();
        fields.insert("isaccepted".into(), Value::Bool(false));
        fields.insert(
            "acceptedtaxon".into(),
            accepted.map_or(Value::Null, Value::String),
        );
        self.store
            .update_resource(TAXON_TABLE, taxon.id()?, fields)
            .await
    }

    /// The accepted genus of a synonym row, created under the holding family
    /// when missing.
    async fn accepted_genus(&self, row: &TaxonRow) -> Result<Record> {
        let genus_item = self.tree.def_item(Rank::Genus);
        if let Some(genus) = find_taxon(self.store, &row.accepted_genus, genus_item.id, None).await? {
            return Ok(genus);
        }

        let family_item = self.tree.def_item(Rank::Family);
        let holding = find_taxon(
            self.store,
            HOLDING_TAXON_NAME,
            family_item.id,
            Some(HOLDING_TAXON_NAME),
        )
        .await?
        .ok_or_else(|| Error::MissingTaxon {
            name: HOLDING_TAXON_NAME.to_string(),
            rank: Rank::Family.to_string(),
        })?;

        create_accepted_taxon(
            self.store,
            self.tree.tree_def_id(),
            genus_item,
            &row.accepted_genus,
            &holding,
            None,
            &self.remarks,
        )
        .await
    }
}
