//! Study runner: align, transform, fill, summarize.
//!
//! Two entry points:
//! - `run_study()`: one study against any series source.
//! - `run_config()`: every study of a config (or one by name) against the
//!   config's data directory.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use stocklab_core::analysis::{
    column_histograms, cumulative_return, daily_return, describe, normalize, period_change,
    ColumnChange, ColumnStats, Histogram, TransformError,
};
use stocklab_core::data::{Aligner, DataError, DateRange, MissingSymbolPolicy, SeriesSource};
use stocklab_core::Table;

use crate::config::{ConfigError, Study, StudyConfig, TransformKind};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),
    #[error("no study named '{0}'")]
    UnknownStudy(String),
}

/// Current schema version for persisted summaries.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Histogram of one column's values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnHistogram {
    pub column: String,
    pub histogram: Histogram,
}

/// Everything about a study run except the table itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySummary {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub study: Study,
    pub rows: usize,
    /// Columns of the output table, in request order.
    pub columns: Vec<String>,
    /// Requested symbols dropped under the skip policy.
    pub skipped: Vec<String>,
    /// Fingerprint of the aligned price table, before any transform.
    pub aligned_fingerprint: String,
    /// Fingerprint of the output table.
    pub table_fingerprint: String,
    /// Columns whose normalization baseline was zero or missing.
    pub undefined: Vec<String>,
    /// First-to-last change of the aligned prices.
    pub changes: Vec<ColumnChange>,
    /// Statistics of the output table.
    pub stats: Vec<ColumnStats>,
    /// Return distributions, computed before fill.
    pub histograms: Vec<ColumnHistogram>,
}

/// Output table plus its summary.
#[derive(Debug, Clone, PartialEq)]
pub struct StudyResult {
    pub summary: StudySummary,
    pub table: Table,
}

impl StudyResult {
    pub fn name(&self) -> &str {
        &self.summary.study.name
    }
}

/// Run one study against `source`.
///
/// Pipeline: align the study's field over its business-day range, apply the
/// transform, take histograms of the unfilled values, then fill.
pub fn run_study(
    study: &Study,
    source: &dyn SeriesSource,
    policy: MissingSymbolPolicy,
) -> Result<StudyResult, RunError> {
    study.validate()?;
    let range = DateRange::business_days(study.start, study.end);
    info!(
        study = %study.name,
        symbols = study.symbols.len(),
        rows = range.len(),
        transform = %study.transform,
        "running study"
    );

    let aligned = Aligner::new(source)
        .field(study.field)
        .policy(policy)
        .align(&study.symbols, &range)?;

    let skipped: Vec<String> = study
        .symbols
        .iter()
        .filter(|s| aligned.column(s).is_none())
        .cloned()
        .collect();
    if !skipped.is_empty() {
        warn!(study = %study.name, ?skipped, "study ran without some symbols");
    }

    let mut undefined = Vec::new();
    let transformed = match study.transform {
        TransformKind::Prices => aligned.clone(),
        TransformKind::Normalized => {
            let normalized = normalize(&aligned, study.baseline_row)?;
            undefined = normalized.undefined;
            normalized.table
        }
        TransformKind::DailyReturn => daily_return(&aligned),
        TransformKind::CumulativeReturn => cumulative_return(&daily_return(&aligned)),
    };

    let histograms = match study.histogram_bins() {
        Some(bins) => column_histograms(&transformed, bins)?
            .into_iter()
            .map(|(column, histogram)| ColumnHistogram { column, histogram })
            .collect(),
        None => Vec::new(),
    };

    let table = study.fill.apply(&transformed);
    debug!(study = %study.name, fill = %study.fill, "applied fill");

    let summary = StudySummary {
        schema_version: SCHEMA_VERSION,
        study: study.clone(),
        rows: table.n_rows(),
        columns: table.column_names().iter().map(|c| c.to_string()).collect(),
        skipped,
        aligned_fingerprint: aligned.fingerprint(),
        table_fingerprint: table.fingerprint(),
        undefined,
        changes: period_change(&aligned),
        stats: describe(&table),
        histograms,
    };

    Ok(StudyResult { summary, table })
}

/// Run the studies of `config` against its data directory.
///
/// With `only`, run just that study. Studies run in file order and the first
/// failure stops the batch.
pub fn run_config(config: &StudyConfig, only: Option<&str>) -> Result<Vec<StudyResult>, RunError> {
    config.validate()?;
    let studies: Vec<&Study> = match only {
        Some(name) => vec![config
            .study(name)
            .ok_or_else(|| RunError::UnknownStudy(name.to_string()))?],
        None => config.studies.iter().collect(),
    };

    let source = config.data.source();
    studies
        .into_iter()
        .map(|study| run_study(study, &source, config.data.missing_policy))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use stocklab_core::analysis::FillMethod;
    use stocklab_core::data::MemorySource;
    use stocklab_core::domain::{PriceRecord, TickerSeries};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 1, day).unwrap()
    }

    fn series(symbol: &str, points: &[(u32, f64)]) -> TickerSeries {
        TickerSeries::new(
            symbol,
            points
                .iter()
                .map(|(day, close)| PriceRecord::close_only(d(*day), *close))
                .collect(),
        )
        .unwrap()
    }

    /// Mon 4th to Fri 8th; `b` has no record on the 6th.
    fn source() -> MemorySource {
        MemorySource::new()
            .with(series(
                "a",
                &[(4, 100.0), (5, 110.0), (6, 121.0), (7, 110.0), (8, 100.0)],
            ))
            .with(series("b", &[(4, 10.0), (5, 20.0), (7, 40.0), (8, 50.0)]))
    }

    fn study(transform: TransformKind) -> Study {
        Study::new("t", &["a", "b"], d(4), d(8), transform)
    }

    #[test]
    fn prices_study_reports_changes() {
        let result = run_study(&study(TransformKind::Prices), &source(), MissingSymbolPolicy::Fail)
            .unwrap();

        assert_eq!(result.table.n_rows(), 5);
        assert_eq!(result.summary.columns, vec!["a", "b"]);
        assert_eq!(result.table.get(2, "b"), None);
        assert_eq!(result.summary.changes[0].change, Some(0.0));
        assert_eq!(result.summary.changes[1].change, Some(4.0));
        assert_eq!(result.summary.aligned_fingerprint, result.summary.table_fingerprint);
        assert!(result.summary.histograms.is_empty());
    }

    #[test]
    fn normalized_study_uses_baseline_row() {
        let s = study(TransformKind::Normalized).with_baseline_row(1);
        let result = run_study(&s, &source(), MissingSymbolPolicy::Fail).unwrap();

        assert_eq!(result.table.row(1), Some(vec![Some(1.0), Some(1.0)]));
        assert_eq!(result.table.get(4, "b"), Some(2.5));
        assert!(result.summary.undefined.is_empty());
    }

    #[test]
    fn normalized_study_reports_undefined_baseline() {
        let s = study(TransformKind::Normalized).with_baseline_row(2);
        let result = run_study(&s, &source(), MissingSymbolPolicy::Fail).unwrap();
        assert_eq!(result.summary.undefined, vec!["b".to_string()]);
    }

    #[test]
    fn baseline_outside_table_is_an_error() {
        let s = study(TransformKind::Normalized).with_baseline_row(5);
        let err = run_study(&s, &source(), MissingSymbolPolicy::Fail).unwrap_err();
        assert!(matches!(
            err,
            RunError::Transform(TransformError::BaselineOutOfRange { index: 5, rows: 5 })
        ));
    }

    #[test]
    fn daily_return_study_histograms_before_fill() {
        let s = study(TransformKind::DailyReturn)
            .with_bins(4)
            .with_fill(FillMethod::Forward);
        let result = run_study(&s, &source(), MissingSymbolPolicy::Fail).unwrap();

        assert_eq!(result.table.get(0, "a"), None);
        assert!((result.table.get(1, "a").unwrap() - (100.0 / 110.0 - 1.0)).abs() < 1e-12);
        // the gap on the 6th removes two returns for b; forward fill pads one
        assert_eq!(result.table.get(2, "b"), Some(-0.5));

        let b = &result.summary.histograms[1];
        assert_eq!(b.column, "b");
        assert_eq!(b.histogram.bins(), 4);
        assert_eq!(b.histogram.total(), 2);
    }

    #[test]
    fn cumulative_study_sums_daily_returns() {
        let result = run_study(
            &study(TransformKind::CumulativeReturn),
            &source(),
            MissingSymbolPolicy::Fail,
        )
        .unwrap();

        // a: returns -1/11, -1/11, 0.1, 0.1 after an undefined first row
        assert_eq!(result.table.get(0, "a"), None);
        let a = result.table.get(4, "a").unwrap();
        assert!((a - (0.2 - 2.0 / 11.0)).abs() < 1e-12);

        // b: the gap on the 6th removes two returns; the total carries over it
        assert_eq!(result.table.get(1, "b"), Some(-0.5));
        assert_eq!(result.table.get(2, "b"), None);
        assert_eq!(result.table.get(3, "b"), None);
        assert!((result.table.get(4, "b").unwrap() + 0.7).abs() < 1e-12);
    }

    #[test]
    fn missing_symbol_policy_is_honoured() {
        let mut s = study(TransformKind::Prices);
        s.symbols.push("zzz".into());

        let err = run_study(&s, &source(), MissingSymbolPolicy::Fail).unwrap_err();
        assert!(matches!(err, RunError::Data(ref e) if e.is_not_found()));

        let result = run_study(&s, &source(), MissingSymbolPolicy::Skip).unwrap();
        assert_eq!(result.summary.skipped, vec!["zzz".to_string()]);
        assert_eq!(result.summary.columns, vec!["a", "b"]);
    }

    #[test]
    fn invalid_study_is_rejected_before_loading() {
        let s = Study::new("t", &["a"], d(8), d(4), TransformKind::Prices);
        let err = run_study(&s, &source(), MissingSymbolPolicy::Fail).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn unknown_study_name() {
        let err = run_config(&StudyConfig::notebook(), Some("nope")).unwrap_err();
        assert!(matches!(err, RunError::UnknownStudy(ref n) if n == "nope"));
    }
}
