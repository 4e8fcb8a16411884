//! Equal-width histograms of column values.

use super::TransformError;
use crate::table::Table;
use serde::{Deserialize, Serialize};

/// Default bin count for return distributions.
pub const DEFAULT_BINS: usize = 20;

/// Counts of values falling into equal-width bins over `[lower, upper]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub lower: f64,
    pub upper: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    pub fn bin_width(&self) -> f64 {
        (self.upper - self.lower) / self.counts.len() as f64
    }

    /// Total number of values counted.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Bin edges, `bins + 1` of them.
    pub fn edges(&self) -> Vec<f64> {
        let width = self.bin_width();
        (0..=self.counts.len())
            .map(|i| self.lower + width * i as f64)
            .collect()
    }
}

/// Bin the finite values into `bins` equal-width bins.
///
/// The maximum lands in the last bin (closed upper edge). Non-finite values
/// are ignored. With no values every count is zero; when every value is the
/// same they all land in the first bin of a zero-width range.
pub fn histogram<I>(values: I, bins: usize) -> Result<Histogram, TransformError>
where
    I: IntoIterator<Item = f64>,
{
    if bins == 0 {
        return Err(TransformError::ZeroBins);
    }

    let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    let mut counts = vec![0; bins];
    let (Some(lower), Some(upper)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Ok(Histogram {
            lower: 0.0,
            upper: 0.0,
            counts,
        });
    };

    let width = (upper - lower) / bins as f64;
    for v in &values {
        let idx = if width > 0.0 {
            (((v - lower) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }

    Ok(Histogram {
        lower,
        upper,
        counts,
    })
}

/// One histogram per column, over that column's present values.
pub fn column_histograms(
    table: &Table,
    bins: usize,
) -> Result<Vec<(String, Histogram)>, TransformError> {
    table
        .columns()
        .iter()
        .map(|c| Ok((c.name().to_string(), histogram(c.valid(), bins)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_land_in_equal_width_bins() {
        let h = histogram(vec![0.0, 1.0, 2.0, 3.0, 4.0], 4).unwrap();
        assert_eq!(h.lower, 0.0);
        assert_eq!(h.upper, 4.0);
        assert_eq!(h.bin_width(), 1.0);
        // 4.0 sits on the closed upper edge of the last bin
        assert_eq!(h.counts, vec![1, 1, 1, 2]);
        assert_eq!(h.edges(), vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn non_finite_values_are_ignored() {
        let h = histogram(vec![f64::NAN, 1.0, f64::INFINITY, 2.0], 2).unwrap();
        assert_eq!(h.total(), 2);
    }

    #[test]
    fn empty_input_gives_zero_counts() {
        let h = histogram(Vec::new(), 3).unwrap();
        assert_eq!(h.counts, vec![0, 0, 0]);
        assert_eq!(h.total(), 0);
    }

    #[test]
    fn identical_values_share_first_bin() {
        let h = histogram(vec![0.5, 0.5, 0.5], 5).unwrap();
        assert_eq!(h.counts, vec![3, 0, 0, 0, 0]);
    }

    #[test]
    fn zero_bins_is_an_error() {
        assert_eq!(histogram(vec![1.0], 0).unwrap_err(), TransformError::ZeroBins);
    }

    #[test]
    fn column_histograms_skip_missing_cells() {
        let dates = vec![
            chrono::NaiveDate::from_ymd_opt(2016, 1, 4).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2016, 1, 5).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2016, 1, 6).unwrap(),
        ];
        let t = Table::from_columns(
            dates,
            vec![
                ("tsla".into(), vec![None, Some(0.01), Some(-0.02)]),
                ("aapl".into(), vec![None, None, Some(0.0)]),
            ],
        )
        .unwrap();
        let hists = column_histograms(&t, DEFAULT_BINS).unwrap();
        assert_eq!(hists[0].0, "tsla");
        assert_eq!(hists[0].1.total(), 2);
        assert_eq!(hists[1].1.total(), 1);
        assert_eq!(hists[1].1.bins(), DEFAULT_BINS);
    }
}
