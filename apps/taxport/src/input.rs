//! # CSV Input
//!
//! Reads the import CSV into [`TaxonRow`]s. Header names and cell values are
//! trimmed of surrounding whitespace.

use anyhow::Context;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use taxport_core::TaxonRow;

/// Read every row of the CSV at `path`.
pub fn read_rows(path: &Path) -> anyhow::Result<Vec<TaxonRow>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
    read_rows_from(file)
}

/// Read every row of a CSV stream. Row numbers in errors start at 1 and do
/// not count the header.
pub fn read_rows_from<R: Read>(reader: R) -> anyhow::Result<Vec<TaxonRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize::<TaxonRow>().enumerate() {
        let row = result.with_context(|| format!("Failed to read row {}", idx + 1))?;
        rows.push(row);
    }
    Ok(rows)
}
