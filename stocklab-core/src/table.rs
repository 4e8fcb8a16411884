//! Date-indexed tables with explicit missing cells.
//!
//! A `Table` is the shape shared by aligned prices and every derived table:
//! one date index, ordered named columns, and `Option<f64>` cells where
//! `None` means "no value". Column length always equals index length.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("column '{column}' has {actual} values but the index has {expected} dates")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
}

/// A named column of optional values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<Option<f64>>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Present values in row order, skipping missing cells.
    pub fn valid(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }

    /// Number of missing cells.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Date-indexed table of optional values.
///
/// Deserialization goes through [`Table::from_columns`], so a decoded table
/// holds the same length and unique-name guarantees as a built one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableParts")]
pub struct Table {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

/// Unchecked serialized form of a [`Table`].
#[derive(Deserialize)]
struct TableParts {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl TryFrom<TableParts> for Table {
    type Error = TableError;

    fn try_from(parts: TableParts) -> Result<Self, Self::Error> {
        let columns = parts
            .columns
            .into_iter()
            .map(|c| (c.name, c.values))
            .collect();
        Self::from_columns(parts.dates, columns)
    }
}

impl Table {
    /// Table with the given index and no columns.
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        Self {
            dates,
            columns: Vec::new(),
        }
    }

    /// Build a table from `(name, values)` pairs in order.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self, TableError> {
        let mut table = Self::new(dates);
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Append a column. Fails on a length mismatch or a repeated name.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<(), TableError> {
        let name = name.into();
        if values.len() != self.dates.len() {
            return Err(TableError::LengthMismatch {
                column: name,
                expected: self.dates.len(),
                actual: values.len(),
            });
        }
        if self.columns.iter().any(|c| c.name == name) {
            return Err(TableError::DuplicateColumn(name));
        }
        self.columns.push(Column { name, values });
        Ok(())
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.dates.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() || self.columns.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cell at `row` in column `name`. `None` for a missing cell, an unknown
    /// column, or an out-of-range row.
    pub fn get(&self, row: usize, name: &str) -> Option<f64> {
        self.column(name)
            .and_then(|c| c.values.get(row).copied().flatten())
    }

    /// All cells of one row, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<Option<f64>>> {
        if row >= self.dates.len() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[row]).collect())
    }

    /// Apply `f` to every column's values, keeping index and column names.
    ///
    /// `f` must return exactly as many values as it was given.
    pub(crate) fn map_columns<F>(&self, mut f: F) -> Table
    where
        F: FnMut(&[Option<f64>]) -> Vec<Option<f64>>,
    {
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let values = f(&c.values);
                debug_assert_eq!(values.len(), self.dates.len());
                Column {
                    name: c.name.clone(),
                    values,
                }
            })
            .collect();
        Table {
            dates: self.dates.clone(),
            columns,
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        self.slice_rows(0, n.min(self.n_rows()))
    }

    /// Last `n` rows.
    pub fn tail(&self, n: usize) -> Table {
        let start = self.n_rows().saturating_sub(n);
        self.slice_rows(start, self.n_rows())
    }

    fn slice_rows(&self, start: usize, end: usize) -> Table {
        Table {
            dates: self.dates[start..end].to_vec(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: c.values[start..end].to_vec(),
                })
                .collect(),
        }
    }

    /// Deterministic BLAKE3 hash over dates, column names and cell values.
    ///
    /// Missing cells hash as a tag byte distinct from any present value, so
    /// `None` and `Some(0.0)` never collide.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(self.dates.len() as u64).to_le_bytes());
        for date in &self.dates {
            hasher.update(date.to_string().as_bytes());
        }
        for column in &self.columns {
            hasher.update(&(column.name.len() as u64).to_le_bytes());
            hasher.update(column.name.as_bytes());
            for value in &column.values {
                match value {
                    Some(v) => {
                        hasher.update(&[1]);
                        hasher.update(&v.to_le_bytes());
                    }
                    None => {
                        hasher.update(&[0]);
                    }
                }
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let base = NaiveDate::from_ymd_opt(2016, 1, 4).unwrap();
        (0..n).map(|i| base + chrono::Duration::days(i as i64)).collect()
    }

    fn sample() -> Table {
        Table::from_columns(
            dates(3),
            vec![
                ("tsla".into(), vec![Some(1.0), None, Some(3.0)]),
                ("aapl".into(), vec![Some(4.0), Some(5.0), Some(6.0)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn push_column_rejects_length_mismatch() {
        let mut t = Table::new(dates(3));
        let err = t.push_column("tsla", vec![Some(1.0)]).unwrap_err();
        assert_eq!(
            err,
            TableError::LengthMismatch {
                column: "tsla".into(),
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn push_column_rejects_duplicate_name() {
        let mut t = sample();
        let err = t.push_column("tsla", vec![None, None, None]).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("tsla".into()));
    }

    #[test]
    fn column_order_is_insertion_order() {
        assert_eq!(sample().column_names(), vec!["tsla", "aapl"]);
    }

    #[test]
    fn get_and_row_expose_missing_cells() {
        let t = sample();
        assert_eq!(t.get(0, "tsla"), Some(1.0));
        assert_eq!(t.get(1, "tsla"), None);
        assert_eq!(t.get(9, "tsla"), None);
        assert_eq!(t.get(0, "msft"), None);
        assert_eq!(t.row(1), Some(vec![None, Some(5.0)]));
        assert_eq!(t.row(3), None);
    }

    #[test]
    fn head_and_tail_slice_rows() {
        let t = sample();
        let head = t.head(2);
        assert_eq!(head.n_rows(), 2);
        assert_eq!(head.column_names(), vec!["tsla", "aapl"]);
        let tail = t.tail(1);
        assert_eq!(tail.dates(), &t.dates()[2..]);
        assert_eq!(tail.get(0, "aapl"), Some(6.0));
        assert_eq!(t.head(10).n_rows(), 3);
    }

    #[test]
    fn fingerprint_is_deterministic_and_distinguishes_missing_from_zero() {
        let a = sample();
        let b = sample();
        assert_eq!(a.fingerprint(), b.fingerprint());

        let zero = Table::from_columns(dates(1), vec![("x".into(), vec![Some(0.0)])]).unwrap();
        let missing = Table::from_columns(dates(1), vec![("x".into(), vec![None])]).unwrap();
        assert_ne!(zero.fingerprint(), missing.fingerprint());
    }

    #[test]
    fn empty_index_table_has_columns_but_no_rows() {
        let t = Table::from_columns(Vec::new(), vec![("tsla".into(), Vec::new())]).unwrap();
        assert_eq!(t.n_rows(), 0);
        assert_eq!(t.n_cols(), 1);
        assert!(t.is_empty());
    }

    #[test]
    fn json_writes_missing_cells_as_null() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["dates"][0], "2016-01-04");
        assert_eq!(json["columns"][0]["name"], "tsla");
        assert!(json["columns"][0]["values"][1].is_null());
        assert_eq!(json["columns"][1]["values"][2], 6.0);
    }

    #[test]
    fn json_round_trips_through_checked_constructor() {
        let t = sample();
        let json = serde_json::to_string(&t).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn json_with_short_column_is_rejected() {
        let json = r#"{"dates":["2016-01-04","2016-01-05"],"columns":[{"name":"x","values":[1.0]}]}"#;
        let err = serde_json::from_str::<Table>(json).unwrap_err();
        assert!(err.to_string().contains("column 'x' has 1 values but the index has 2 dates"));
    }

    #[test]
    fn json_with_repeated_column_is_rejected() {
        let json = r#"{"dates":["2016-01-04"],"columns":[{"name":"x","values":[1.0]},{"name":"x","values":[2.0]}]}"#;
        let err = serde_json::from_str::<Table>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate column 'x'"));
    }
}
