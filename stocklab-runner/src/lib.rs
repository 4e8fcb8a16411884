//! StockLab Runner: configured studies, summaries, and artifact export.
//!
//! This crate builds on `stocklab-core` to provide:
//! - TOML study files (data directory, missing-symbol policy, studies)
//! - The built-in notebook studies
//! - A study runner: align → transform → fill → summarize
//! - CSV / JSON / Parquet artifact bundles per study

pub mod config;
pub mod export;
pub mod study;

pub use config::{ConfigError, DataConfig, Study, StudyConfig, TransformKind, DEFAULT_DATA_DIR};
pub use export::{
    export_summary_json, import_summary_json, load_summary, load_table, save_artifacts,
    table_to_csv,
};
pub use study::{
    run_config, run_study, ColumnHistogram, RunError, StudyResult, StudySummary, SCHEMA_VERSION,
};
