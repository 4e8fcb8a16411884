//! Table transforms: returns, fills, summaries, and distributions.
//!
//! Every transform is a pure function of its input table. Derived tables keep
//! the source's date index and column set; only the cell values change.

pub mod fill;
pub mod histogram;
pub mod returns;
pub mod summary;

pub use fill::{forward_fill, interpolate, FillMethod};
pub use histogram::{column_histograms, histogram, Histogram, DEFAULT_BINS};
pub use returns::{cumulative_return, daily_return, normalize, Normalized};
pub use summary::{describe, period_change, ColumnChange, ColumnStats};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("baseline row {index} is out of range for a table with {rows} rows")]
    BaselineOutOfRange { index: usize, rows: usize },

    #[error("histogram needs at least one bin")]
    ZeroBins,
}
