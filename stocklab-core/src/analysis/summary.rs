//! Per-column summaries: start-to-end change and descriptive statistics.

use crate::table::Table;
use serde::{Deserialize, Serialize};

/// Change of one column between the first and last row of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnChange {
    pub column: String,
    pub first: Option<f64>,
    pub last: Option<f64>,
    /// `(last - first) / first`; missing when either end is missing or the
    /// first value is zero.
    pub change: Option<f64>,
}

/// `(last - first) / first` for every column, using the first and last rows.
///
/// The ends are taken literally: a gap on the first or last row gives a
/// missing change rather than searching inward for a present value.
pub fn period_change(table: &Table) -> Vec<ColumnChange> {
    table
        .columns()
        .iter()
        .map(|column| {
            let first = column.values().first().copied().flatten();
            let last = column.values().last().copied().flatten();
            let change = match (first, last) {
                (Some(f), Some(l)) if f != 0.0 => Some((l - f) / f),
                _ => None,
            };
            ColumnChange {
                column: column.name().to_string(),
                first,
                last,
                change,
            }
        })
        .collect()
}

/// Descriptive statistics over the present cells of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1); needs at least two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub fn describe(table: &Table) -> Vec<ColumnStats> {
    table
        .columns()
        .iter()
        .map(|column| {
            let values: Vec<f64> = column.valid().collect();
            let count = values.len();
            let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
            let std = match mean {
                Some(m) if count > 1 => {
                    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
                    Some((ss / (count - 1) as f64).sqrt())
                }
                _ => None,
            };
            ColumnStats {
                column: column.name().to_string(),
                count,
                missing: column.missing_count(),
                mean,
                std,
                min: values.iter().copied().reduce(f64::min),
                max: values.iter().copied().reduce(f64::max),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(columns: Vec<(&str, Vec<Option<f64>>)>) -> Table {
        let rows = columns[0].1.len();
        let base = NaiveDate::from_ymd_opt(2016, 11, 10).unwrap();
        let dates = (0..rows)
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect();
        Table::from_columns(
            dates,
            columns
                .into_iter()
                .map(|(n, v)| (n.to_string(), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn period_change_uses_first_and_last_rows() {
        let t = table(vec![
            ("aapl", vec![Some(100.0), Some(120.0), Some(150.0)]),
            ("intc", vec![Some(40.0), None, Some(30.0)]),
        ]);
        let changes = period_change(&t);
        assert_eq!(changes[0].change, Some(0.5));
        assert_eq!(changes[1].change, Some(-0.25));
        assert_eq!(changes[1].first, Some(40.0));
    }

    #[test]
    fn period_change_missing_end_is_missing() {
        let t = table(vec![("x", vec![Some(1.0), None])]);
        assert_eq!(period_change(&t)[0].change, None);
        let t = table(vec![("x", vec![Some(0.0), Some(1.0)])]);
        assert_eq!(period_change(&t)[0].change, None);
    }

    #[test]
    fn describe_ignores_missing_cells() {
        let t = table(vec![("x", vec![Some(2.0), None, Some(4.0), Some(6.0)])]);
        let stats = &describe(&t)[0];
        assert_eq!(stats.count, 3);
        assert_eq!(stats.missing, 1);
        assert_eq!(stats.mean, Some(4.0));
        assert_eq!(stats.std, Some(2.0));
        assert_eq!(stats.min, Some(2.0));
        assert_eq!(stats.max, Some(6.0));
    }

    #[test]
    fn describe_single_value_has_no_std() {
        let t = table(vec![("x", vec![Some(5.0), None])]);
        let stats = &describe(&t)[0];
        assert_eq!(stats.mean, Some(5.0));
        assert_eq!(stats.std, None);
    }

    #[test]
    fn describe_all_missing() {
        let t = table(vec![("x", vec![None, None])]);
        let stats = &describe(&t)[0];
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.min, None);
    }
}
