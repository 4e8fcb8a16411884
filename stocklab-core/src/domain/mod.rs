//! Domain types for StockLab

pub mod record;
pub mod series;

pub use record::{PriceField, PriceRecord};
pub use series::{SeriesError, TickerSeries};
