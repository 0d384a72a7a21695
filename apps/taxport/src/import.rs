//! # Import Pipeline
//!
//! Store-agnostic part of an import run: load the tree context, resolve
//! every row in order, then gather the resulting species into a record set.
//! Any failure stops the run; rows already imported stay imported.

use anyhow::Context;
use serde::Serialize;
use taxport_core::{
    Record, RecordExt, RecordSetSpec, ResourceStore, RowOutcome, TaxonAction, TaxonResolver,
    TaxonRow, TaxonTree, TreeAnchor, create_recordset,
};
use tracing::info;

/// Tally of one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Species taxon id of each row, in row order.
    pub species_ids: Vec<i64>,
    pub created: usize,
    pub author_updated: usize,
    pub synonymized: usize,
    pub unchanged: usize,
    /// Resource URI of the record set, once created.
    pub recordset: Option<String>,
}

impl ImportReport {
    fn record(&mut self, outcome: &RowOutcome) {
        self.species_ids.push(outcome.species_id);
        for (_, action) in &outcome.actions {
            match action {
                TaxonAction::Created => self.created += 1,
                TaxonAction::AuthorUpdated => self.author_updated += 1,
                TaxonAction::Synonymized => self.synonymized += 1,
                TaxonAction::Fetched => self.unchanged += 1,
            }
        }
    }
}

/// Settings of the store-side part of a run.
#[derive(Debug, Clone)]
pub struct ImportPlan<'a> {
    pub anchor: &'a TreeAnchor,
    pub remarks: &'a str,
    pub recordset: RecordSetSpec,
}

/// Load the tree context of `discipline`, import `rows`, and create the
/// record set.
pub async fn run_import<S: ResourceStore>(
    store: &S,
    discipline: &Record,
    rows: &[TaxonRow],
    plan: &ImportPlan<'_>,
) -> anyhow::Result<ImportReport> {
    let tree = TaxonTree::load(store, discipline, plan.anchor, plan.remarks)
        .await
        .context("Failed to fetch tree info")?;
    println!("Fetched tree items");

    let mut report = import_rows(store, &tree, rows, plan.remarks).await?;

    println!("Creating '{}' recordset with results", plan.recordset.name);
    let recordset = create_recordset(store, &plan.recordset, &report.species_ids)
        .await
        .context("Failed to create recordset")?;
    report.recordset = Some(recordset.resource_uri()?.to_string());
    info!(
        "Created recordset {} with {} species",
        plan.recordset.name,
        report.species_ids.len()
    );

    Ok(report)
}

/// Resolve `rows` in order against an already loaded tree.
pub async fn import_rows<S: ResourceStore>(
    store: &S,
    tree: &TaxonTree,
    rows: &[TaxonRow],
    remarks: &str,
) -> anyhow::Result<ImportReport> {
    let resolver = TaxonResolver::new(store, tree).with_remarks(remarks);
    let mut report = ImportReport::default();

    for (idx, row) in rows.iter().enumerate() {
        let line = idx + 1;
        println!(
            "Processing row {}: {} > {} > {} > {}",
            line, row.order, row.family, row.genus, row.species
        );
        let outcome = resolver
            .process_row(row)
            .await
            .with_context(|| format!("Failed to import row {} ({} {})", line, row.genus, row.species))?;

        for (rank, action) in &outcome.actions {
            if *action != TaxonAction::Fetched {
                info!("row {} | {} {} | {:?}", line, rank, row.name_at(*rank), action);
            }
        }
        report.record(&outcome);
    }

    Ok(report)
}
