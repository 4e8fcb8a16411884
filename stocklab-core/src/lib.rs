//! StockLab Core: ticker series, business-day alignment, return transforms.
//!
//! This crate contains everything that computes tables:
//! - Domain types (price records, ticker series, price fields)
//! - Series sources (directory of delimited files, in-memory)
//! - Business-day date ranges
//! - Multi-symbol alignment onto a date index with explicit missing cells
//! - Return transforms (daily, cumulative, normalized), fills, summaries,
//!   and histograms
//! - Parquet hand-off for external rendering
//!
//! Nothing here renders or prints; presentation lives with the caller.

pub mod analysis;
pub mod data;
pub mod domain;
pub mod table;

pub use table::{Column, Table, TableError};
