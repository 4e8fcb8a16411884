//! Data loading, business-day calendar, and alignment

pub mod align;
pub mod calendar;
pub mod csv_source;
pub mod parquet;
pub mod provider;

pub use align::{align, Aligner, MissingSymbolPolicy};
pub use calendar::{is_business_day, parse_date, CalendarError, DateRange};
pub use csv_source::{parse_series, CsvDirSource, DEFAULT_SUFFIX};
pub use provider::{DataError, MemorySource, SeriesSource};
