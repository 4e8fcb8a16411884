//! Series source trait and structured error types.
//!
//! The SeriesSource trait abstracts over where ticker history lives (a
//! directory of delimited files, an in-memory map) so the aligner can be
//! exercised without touching the filesystem.

use crate::domain::TickerSeries;
use crate::table::TableError;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("no data source for symbol '{symbol}' (looked for {path:?})")]
    NotFound { symbol: String, path: PathBuf },

    #[error("malformed record for '{symbol}' at line {line}: {reason}")]
    MalformedRecord {
        symbol: String,
        line: u64,
        reason: String,
    },

    #[error("symbol '{0}' requested more than once")]
    DuplicateSymbol(String),

    #[error("table error: {0}")]
    Table(#[from] TableError),

    #[error("parquet I/O error: {0}")]
    Parquet(String),

    #[error("I/O error reading '{symbol}': {source}")]
    Io {
        symbol: String,
        #[source]
        source: std::io::Error,
    },
}

impl DataError {
    /// True for the error kind a skip policy may drop.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataError::NotFound { .. })
    }
}

/// Anything that can hand back a ticker's full recorded history.
///
/// Implementations return every record they have, unfiltered. Fetching is
/// read-only and has no side effects on the source.
pub trait SeriesSource {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Load the full series for `symbol`.
    fn fetch(&self, symbol: &str) -> Result<TickerSeries, DataError>;
}

/// Series held in memory, keyed by lowercase symbol.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    series: HashMap<String, TickerSeries>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: TickerSeries) {
        self.series
            .insert(series.symbol().to_ascii_lowercase(), series);
    }

    pub fn with(mut self, series: TickerSeries) -> Self {
        self.insert(series);
        self
    }
}

impl SeriesSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch(&self, symbol: &str) -> Result<TickerSeries, DataError> {
        self.series
            .get(&symbol.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| DataError::NotFound {
                symbol: symbol.to_string(),
                path: PathBuf::from(format!("memory:{symbol}")),
            })
    }
}
