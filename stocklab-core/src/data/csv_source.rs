//! Delimited-file series source.
//!
//! Layout: `{root}/{lowercase symbol}{suffix}`, e.g. `Data/Stocks/aapl.us.txt`.
//!
//! Each file has a header row naming at least `Date` and `Close` (matched
//! case-insensitively); `Open`, `High`, `Low`, `Volume` and `OpenInt` are
//! optional. Rows may appear in any order. Every row must parse: a bad date
//! or non-numeric value fails the whole load rather than being skipped.

use super::provider::{DataError, SeriesSource};
use crate::domain::{PriceRecord, TickerSeries};
use chrono::NaiveDate;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default file suffix of the per-ticker files.
pub const DEFAULT_SUFFIX: &str = ".us.txt";

/// Date format of the `Date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Series source reading one delimited file per symbol from a directory.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    root: PathBuf,
    suffix: String,
}

impl CsvDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            suffix: DEFAULT_SUFFIX.to_string(),
        }
    }

    /// Override the file suffix (default `.us.txt`).
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `symbol`.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.root
            .join(format!("{}{}", symbol.to_ascii_lowercase(), self.suffix))
    }
}

impl SeriesSource for CsvDirSource {
    fn name(&self) -> &str {
        "csv-dir"
    }

    fn fetch(&self, symbol: &str) -> Result<TickerSeries, DataError> {
        let path = self.path_for(symbol);
        if !path.is_file() {
            return Err(DataError::NotFound {
                symbol: symbol.to_string(),
                path,
            });
        }
        let file = File::open(&path).map_err(|source| DataError::Io {
            symbol: symbol.to_string(),
            source,
        })?;
        let series = parse_series(symbol, file)?;
        debug!(
            symbol,
            rows = series.len(),
            path = %path.display(),
            "loaded series"
        );
        Ok(series)
    }
}

/// Column positions resolved from the header row.
#[derive(Debug, Default)]
struct HeaderMap {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
    open_interest: Option<usize>,
}

impl HeaderMap {
    fn resolve(symbol: &str, headers: &csv::StringRecord) -> Result<Self, DataError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| DataError::MalformedRecord {
                symbol: symbol.to_string(),
                line: 1,
                reason: format!("missing required column '{name}'"),
            })
        };

        Ok(Self {
            date: required("date")?,
            close: required("close")?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
            open_interest: find("openint"),
        })
    }
}

/// Parse a full delimited file for `symbol` into a sorted series.
pub fn parse_series<R: Read>(symbol: &str, reader: R) -> Result<TickerSeries, DataError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| csv_error(symbol, 1, e))?
        .clone();
    let columns = HeaderMap::resolve(symbol, &headers)?;

    // Keyed by date so the map is both the duplicate check and the sort.
    let mut by_date: BTreeMap<NaiveDate, (u64, PriceRecord)> = BTreeMap::new();
    for (i, row) in rdr.records().enumerate() {
        // Header is line 1; fall back to the row count when csv has no position.
        let fallback_line = i as u64 + 2;
        let row = row.map_err(|e| csv_error(symbol, fallback_line, e))?;
        let line = row
            .position()
            .map(|p| p.line())
            .unwrap_or(fallback_line);
        let malformed = |reason: String| DataError::MalformedRecord {
            symbol: symbol.to_string(),
            line,
            reason,
        };

        let record = parse_row(&row, &columns).map_err(malformed)?;
        match by_date.entry(record.date) {
            Entry::Occupied(first) => {
                return Err(malformed(format!(
                    "duplicate date {} (first seen at line {})",
                    record.date,
                    first.get().0
                )));
            }
            Entry::Vacant(slot) => {
                slot.insert((line, record));
            }
        }
    }

    let records = by_date.into_values().map(|(_, record)| record).collect();
    Ok(TickerSeries::from_ordered(symbol, records))
}

fn parse_row(row: &csv::StringRecord, columns: &HeaderMap) -> Result<PriceRecord, String> {
    let cell = |idx: usize| row.get(idx).unwrap_or("");
    let optional = |idx: Option<usize>| idx.map(cell).unwrap_or("");

    let raw_date = cell(columns.date);
    let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
        .map_err(|e| format!("bad date '{raw_date}': {e}"))?;

    Ok(PriceRecord {
        date,
        open: parse_price("open", optional(columns.open))?,
        high: parse_price("high", optional(columns.high))?,
        low: parse_price("low", optional(columns.low))?,
        close: parse_price("close", cell(columns.close))?,
        volume: parse_count("volume", optional(columns.volume))?,
        open_interest: parse_count("openint", optional(columns.open_interest))?,
    })
}

/// Empty cells and the literal `nan` are missing values; anything else must
/// be a finite number.
fn parse_price(column: &str, raw: &str) -> Result<Option<f64>, String> {
    if is_missing(raw) {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(format!("non-numeric {column} '{raw}'")),
    }
}

/// Counts are usually integers but some exports write `1234.0`.
fn parse_count(column: &str, raw: &str) -> Result<Option<u64>, String> {
    if is_missing(raw) {
        return Ok(None);
    }
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(Some(v));
    }
    match raw.parse::<f64>() {
        // `u64::MAX as f64` rounds up to 2^64, which is itself out of range.
        Ok(v) if v >= 0.0 && v < u64::MAX as f64 && v.fract() == 0.0 => Ok(Some(v as u64)),
        _ => Err(format!("invalid {column} '{raw}'")),
    }
}

fn is_missing(raw: &str) -> bool {
    raw.is_empty() || raw.eq_ignore_ascii_case("nan")
}

fn csv_error(symbol: &str, fallback_line: u64, e: csv::Error) -> DataError {
    let line = e
        .position()
        .map(|p| p.line())
        .unwrap_or(fallback_line);
    DataError::MalformedRecord {
        symbol: symbol.to_string(),
        line,
        reason: e.to_string(),
    }
}
