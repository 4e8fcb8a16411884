//! Daily return, cumulative return, and normalization.

use super::TransformError;
use crate::table::Table;
use serde::Serialize;
use tracing::warn;

/// Day-over-day return per column: `price[i-1] / price[i] - 1`.
///
/// The ratio is previous over current, so a rising price gives a negative
/// value: `[100, 110]` yields `100 / 110 - 1 ≈ -0.0909` on row 1. Row 0 has
/// no previous row and is always missing. A missing cell on either side, or
/// a current price of zero, gives a missing result.
pub fn daily_return(table: &Table) -> Table {
    table.map_columns(|values| {
        (0..values.len())
            .map(|i| {
                if i == 0 {
                    return None;
                }
                match (values[i - 1], values[i]) {
                    (Some(prev), Some(cur)) if cur != 0.0 => Some(prev / cur - 1.0),
                    _ => None,
                }
            })
            .collect()
    })
}

/// Running sum per column, starting from zero.
///
/// `[10, -2, 5]` becomes `[10, 8, 13]`. This is a plain sum of the values,
/// not a compounded product. Missing cells stay missing and do not reset the
/// running total.
pub fn cumulative_return(table: &Table) -> Table {
    table.map_columns(|values| {
        let mut total = 0.0;
        values
            .iter()
            .map(|v| {
                v.map(|x| {
                    total += x;
                    total
                })
            })
            .collect()
    })
}

/// A normalized table plus the columns that could not be normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Normalized {
    pub table: Table,
    /// Columns whose baseline was zero or missing. Every cell of these
    /// columns is missing in `table`.
    pub undefined: Vec<String>,
}

/// Divide every column by its own value at `baseline_row`.
///
/// The baseline row becomes exactly 1.0 wherever it is defined. Negative
/// baselines divide normally. A zero or missing baseline makes the division
/// undefined: that column comes back entirely missing and is listed in
/// [`Normalized::undefined`], while sibling columns are unaffected.
pub fn normalize(table: &Table, baseline_row: usize) -> Result<Normalized, TransformError> {
    if baseline_row >= table.n_rows() {
        return Err(TransformError::BaselineOutOfRange {
            index: baseline_row,
            rows: table.n_rows(),
        });
    }

    let mut undefined = Vec::new();
    for column in table.columns() {
        match column.values()[baseline_row] {
            Some(base) if base != 0.0 => {}
            base => {
                warn!(
                    column = column.name(),
                    baseline_row,
                    ?base,
                    "normalization undefined for column"
                );
                undefined.push(column.name().to_string());
            }
        }
    }

    let table = table.map_columns(|values| match values[baseline_row] {
        Some(base) if base != 0.0 => values.iter().map(|v| v.map(|x| x / base)).collect(),
        _ => vec![None; values.len()],
    });

    Ok(Normalized { table, undefined })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table(columns: Vec<(&str, Vec<Option<f64>>)>) -> Table {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let base = NaiveDate::from_ymd_opt(2016, 1, 4).unwrap();
        let dates = (0..rows)
            .map(|i| base + chrono::Duration::days(i as i64))
            .collect();
        Table::from_columns(
            dates,
            columns
                .into_iter()
                .map(|(name, values)| (name.to_string(), values))
                .collect(),
        )
        .unwrap()
    }

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn daily_return_uses_previous_over_current() {
        let t = table(vec![("x", vec![Some(100.0), Some(110.0), Some(121.0)])]);
        let dr = daily_return(&t);

        assert_eq!(dr.get(0, "x"), None);
        assert!(approx(dr.get(1, "x"), 100.0 / 110.0 - 1.0));
        assert!(approx(dr.get(2, "x"), 110.0 / 121.0 - 1.0));
        assert!((dr.get(1, "x").unwrap() + 0.0909).abs() < 1e-4);
    }

    #[test]
    fn daily_return_first_row_missing_for_every_column() {
        let t = table(vec![
            ("a", vec![Some(1.0), Some(2.0)]),
            ("b", vec![Some(3.0), Some(4.0)]),
        ]);
        assert_eq!(daily_return(&t).row(0), Some(vec![None, None]));
    }

    #[test]
    fn daily_return_propagates_missing() {
        let t = table(vec![("x", vec![Some(1.0), None, Some(2.0), Some(4.0)])]);
        let dr = daily_return(&t);
        assert_eq!(dr.get(1, "x"), None);
        assert_eq!(dr.get(2, "x"), None);
        assert!(approx(dr.get(3, "x"), -0.5));
    }

    #[test]
    fn daily_return_zero_price_is_missing() {
        let t = table(vec![("x", vec![Some(1.0), Some(0.0)])]);
        assert_eq!(daily_return(&t).get(1, "x"), None);
    }

    #[test]
    fn cumulative_return_is_running_sum() {
        let t = table(vec![("x", vec![Some(10.0), Some(-2.0), Some(5.0)])]);
        let cr = cumulative_return(&t);
        assert_eq!(cr.column("x").unwrap().values(), &[Some(10.0), Some(8.0), Some(13.0)]);
    }

    #[test]
    fn cumulative_return_skips_missing_without_reset() {
        let t = table(vec![("x", vec![Some(1.0), None, Some(2.0)])]);
        let cr = cumulative_return(&t);
        assert_eq!(cr.column("x").unwrap().values(), &[Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn normalize_divides_by_baseline() {
        let t = table(vec![("x", vec![Some(50.0), Some(75.0), Some(100.0)])]);
        let n = normalize(&t, 0).unwrap();
        assert_eq!(n.table.column("x").unwrap().values(), &[Some(1.0), Some(1.5), Some(2.0)]);
        assert!(n.undefined.is_empty());
    }

    #[test]
    fn normalize_baseline_row_is_exactly_one() {
        let t = table(vec![
            ("a", vec![Some(3.7), Some(11.3)]),
            ("b", vec![Some(-2.5), Some(5.0)]),
        ]);
        let n = normalize(&t, 1).unwrap();
        assert_eq!(n.table.row(1), Some(vec![Some(1.0), Some(1.0)]));
        assert_eq!(n.table.get(0, "b"), Some(-0.5));
    }

    #[test]
    fn normalize_zero_baseline_marks_column_undefined_only() {
        let t = table(vec![
            ("zero", vec![Some(0.0), Some(5.0)]),
            ("ok", vec![Some(2.0), Some(4.0)]),
        ]);
        let n = normalize(&t, 0).unwrap();

        assert_eq!(n.undefined, vec!["zero".to_string()]);
        assert_eq!(n.table.column("zero").unwrap().values(), &[None, None]);
        assert_eq!(n.table.column("ok").unwrap().values(), &[Some(1.0), Some(2.0)]);
    }

    #[test]
    fn normalize_missing_baseline_is_undefined() {
        let t = table(vec![("x", vec![None, Some(5.0)])]);
        let n = normalize(&t, 0).unwrap();
        assert_eq!(n.undefined, vec!["x".to_string()]);
        assert_eq!(n.table.get(1, "x"), None);
    }

    #[test]
    fn normalize_rejects_out_of_range_baseline() {
        let t = table(vec![("x", vec![Some(1.0)])]);
        assert_eq!(
            normalize(&t, 1).unwrap_err(),
            TransformError::BaselineOutOfRange { index: 1, rows: 1 }
        );
    }

    #[test]
    fn transforms_preserve_index_and_columns() {
        let t = table(vec![
            ("a", vec![Some(1.0), Some(2.0), None]),
            ("b", vec![None, Some(2.0), Some(3.0)]),
        ]);
        for derived in [
            daily_return(&t),
            cumulative_return(&t),
            normalize(&t, 1).unwrap().table,
        ] {
            assert_eq!(derived.dates(), t.dates());
            assert_eq!(derived.column_names(), t.column_names());
        }
    }
}
