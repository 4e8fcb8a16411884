//! TickerSeries: the full recorded history of one symbol.

use super::record::{PriceField, PriceRecord};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeriesError {
    #[error("duplicate date {date} in series '{symbol}'")]
    DuplicateDate { symbol: String, date: NaiveDate },
}

/// Ordered, immutable price history for a single ticker.
///
/// Records are strictly increasing by date. Construction sorts the input
/// and rejects duplicate dates, so every accessor can rely on the ordering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSeries {
    symbol: String,
    records: Vec<PriceRecord>,
}

impl TickerSeries {
    pub fn new(
        symbol: impl Into<String>,
        mut records: Vec<PriceRecord>,
    ) -> Result<Self, SeriesError> {
        let symbol = symbol.into();
        records.sort_by_key(|r| r.date);
        if let Some(pair) = records.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(SeriesError::DuplicateDate {
                symbol,
                date: pair[0].date,
            });
        }
        Ok(Self { symbol, records })
    }

    /// Wrap records the caller has already ordered strictly by date.
    pub(crate) fn from_ordered(symbol: impl Into<String>, records: Vec<PriceRecord>) -> Self {
        debug_assert!(records.windows(2).all(|w| w[0].date < w[1].date));
        Self {
            symbol: symbol.into(),
            records,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Record for an exact date, if the series has one.
    pub fn get(&self, date: NaiveDate) -> Option<&PriceRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|i| &self.records[i])
    }

    /// Value of `field` on `date`. `None` when the date is not recorded or
    /// the field is empty on that day.
    pub fn value_on(&self, date: NaiveDate, field: PriceField) -> Option<f64> {
        self.get(date).and_then(|r| r.field(field))
    }

    /// `(date, value)` pairs for one field across the whole history.
    pub fn column(&self, field: PriceField) -> Vec<(NaiveDate, Option<f64>)> {
        self.records.iter().map(|r| (r.date, r.field(field))).collect()
    }
}
