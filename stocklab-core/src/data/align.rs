//! Multi-symbol time alignment.
//!
//! Given a list of symbols and a date range, load each symbol's series and
//! left-join one field onto the range. The range is the index: every date in
//! it gets a row, and a symbol with no record on a date gets a missing cell.
//! Nothing is forward-filled or interpolated here; those are separate steps.

use super::calendar::DateRange;
use super::provider::{DataError, SeriesSource};
use crate::domain::{PriceField, TickerSeries};
use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// What to do when a requested symbol has no backing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSymbolPolicy {
    /// Fail the whole alignment with `DataError::NotFound`. No partial table.
    #[default]
    Fail,
    /// Drop the symbol's column, log a warning, and continue.
    ///
    /// Only `NotFound` is skipped; malformed files still fail.
    Skip,
}

/// Aligns several tickers onto one date index.
pub struct Aligner<'a> {
    source: &'a dyn SeriesSource,
    field: PriceField,
    policy: MissingSymbolPolicy,
}

impl<'a> Aligner<'a> {
    /// Close prices, failing on missing symbols.
    pub fn new(source: &'a dyn SeriesSource) -> Self {
        Self {
            source,
            field: PriceField::Close,
            policy: MissingSymbolPolicy::Fail,
        }
    }

    pub fn field(mut self, field: PriceField) -> Self {
        self.field = field;
        self
    }

    pub fn policy(mut self, policy: MissingSymbolPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Join each symbol's field onto `range`, one column per symbol in
    /// request order.
    pub fn align<S: AsRef<str>>(
        &self,
        symbols: &[S],
        range: &DateRange,
    ) -> Result<Table, DataError> {
        let mut seen = HashSet::new();
        for symbol in symbols {
            let symbol = symbol.as_ref();
            if !seen.insert(symbol.to_ascii_lowercase()) {
                return Err(DataError::DuplicateSymbol(symbol.to_string()));
            }
        }

        let mut table = Table::new(range.dates().to_vec());

        for symbol in symbols {
            let symbol = symbol.as_ref();
            let series = match self.source.fetch(symbol) {
                Ok(series) => series,
                Err(e) if e.is_not_found() && self.policy == MissingSymbolPolicy::Skip => {
                    warn!(symbol, source = self.source.name(), "skipping missing symbol: {e}");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let values = join_onto(&series, range, self.field);
            let covered = values.iter().filter(|v| v.is_some()).count();
            debug!(
                symbol,
                field = %self.field,
                covered,
                rows = range.len(),
                "aligned series"
            );

            table.push_column(symbol, values)?;
        }

        Ok(table)
    }
}

/// Align close prices with the default (fail) missing-symbol policy.
pub fn align<S: AsRef<str>>(
    source: &dyn SeriesSource,
    symbols: &[S],
    range: &DateRange,
) -> Result<Table, DataError> {
    Aligner::new(source).align(symbols, range)
}

/// Left join: walk both sorted sequences once.
fn join_onto(series: &TickerSeries, range: &DateRange, field: PriceField) -> Vec<Option<f64>> {
    let records = series.records();
    let mut cursor = 0;
    range
        .iter()
        .map(|date| {
            while cursor < records.len() && records[cursor].date < *date {
                cursor += 1;
            }
            match records.get(cursor) {
                Some(r) if r.date == *date => r.field(field),
                _ => None,
            }
        })
        .collect()
}
