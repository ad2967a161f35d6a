use std::fmt;
use std::io::Read;

use serde::Deserialize;
use tracing::info;

use super::CommandError;
use crate::storage::Database;

#[derive(Debug, Deserialize)]
struct CountryRow {
    name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub skipped: usize,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} countries imported, {} already present",
            self.inserted, self.skipped
        )
    }
}

/// Load countries from CSV with a `name` header. Existing names and blank rows are skipped.
pub async fn import_countries<R: Read>(
    db: &Database,
    reader: R,
) -> Result<ImportSummary, CommandError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut names = Vec::new();
    for record in csv_reader.deserialize::<CountryRow>() {
        let row = record?;
        if !row.name.is_empty() {
            names.push(row.name);
        }
    }

    let mut summary = ImportSummary::default();
    for name in names {
        if db.insert_country_if_missing(&name).await? {
            summary.inserted += 1;
        } else {
            summary.skipped += 1;
        }
    }

    info!(inserted = summary.inserted, skipped = summary.skipped, "countries imported");
    Ok(summary)
}
