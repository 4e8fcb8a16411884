//! Export: CSV tables, JSON summaries, and per-study artifact bundles.
//!
//! - **CSV**: `date` followed by one column per symbol; missing cells are
//!   empty, never zero.
//! - **JSON**: the study summary with a `schema_version` field. Unknown
//!   versions are rejected on load.
//! - **Parquet**: the table for external plotting tools.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use stocklab_core::data::parquet;
use stocklab_core::Table;
use tracing::info;

use crate::study::{StudyResult, StudySummary, SCHEMA_VERSION};

pub const TABLE_CSV: &str = "table.csv";
pub const SUMMARY_JSON: &str = "summary.json";
pub const TABLE_PARQUET: &str = "table.parquet";

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a table as CSV. Values keep full precision.
pub fn table_to_csv(table: &Table) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["date"];
    header.extend(table.column_names());
    wtr.write_record(&header)?;

    for (i, date) in table.dates().iter().enumerate() {
        let mut record = vec![date.to_string()];
        record.extend(
            table
                .columns()
                .iter()
                .map(|c| c.values()[i].map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_summary_json(summary: &StudySummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize StudySummary to JSON")
}

/// Deserialize a summary, rejecting unknown schema versions.
pub fn import_summary_json(json: &str) -> Result<StudySummary> {
    let summary: StudySummary =
        serde_json::from_str(json).context("failed to deserialize StudySummary from JSON")?;
    if summary.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            summary.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(summary)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one study.
///
/// Creates `{output_dir}/{study name}/` containing:
/// - `table.csv`: the output table
/// - `summary.json`: the full `StudySummary`
/// - `table.parquet`: the output table for plotting tools
///
/// Rerunning a study overwrites its previous bundle. Returns the directory.
pub fn save_artifacts(result: &StudyResult, output_dir: &Path) -> Result<PathBuf> {
    let study_dir = output_dir.join(result.name());
    std::fs::create_dir_all(&study_dir)
        .with_context(|| format!("failed to create artifact dir: {}", study_dir.display()))?;

    let csv = table_to_csv(&result.table)?;
    std::fs::write(study_dir.join(TABLE_CSV), csv)
        .with_context(|| format!("failed to write {TABLE_CSV}"))?;

    let json = export_summary_json(&result.summary)?;
    std::fs::write(study_dir.join(SUMMARY_JSON), json)
        .with_context(|| format!("failed to write {SUMMARY_JSON}"))?;

    parquet::write_table(&result.table, &study_dir.join(TABLE_PARQUET))
        .with_context(|| format!("failed to write {TABLE_PARQUET}"))?;

    info!(study = result.name(), dir = %study_dir.display(), "saved artifacts");
    Ok(study_dir)
}

/// Load the summary from an artifact directory.
pub fn load_summary(study_dir: &Path) -> Result<StudySummary> {
    let path = study_dir.join(SUMMARY_JSON);
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_summary_json(&json)
}

/// Load the table from an artifact directory.
pub fn load_table(study_dir: &Path) -> Result<Table> {
    let path = study_dir.join(TABLE_PARQUET);
    parquet::read_table(&path).with_context(|| format!("failed to read {}", path.display()))
}
