//! Serializable study configuration.
//!
//! A study file names a data directory and one or more studies:
//!
//! ```toml
//! [data]
//! dir = "Data/Stocks"
//! suffix = ".us.txt"
//! missing_policy = "fail"
//!
//! [[study]]
//! name = "daily-tsla-aapl"
//! symbols = ["tsla", "aapl"]
//! start = "2016-01-01"
//! end = "2016-12-31"
//! transform = "daily_return"
//! fill = "interpolate"
//! bins = 20
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use stocklab_core::analysis::{FillMethod, DEFAULT_BINS};
use stocklab_core::data::{CsvDirSource, MissingSymbolPolicy, DEFAULT_SUFFIX};
use stocklab_core::domain::PriceField;
use thiserror::Error;

/// Default directory of per-ticker files.
pub const DEFAULT_DATA_DIR: &str = "Data/Stocks";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid study '{study}': {reason}")]
    Invalid { study: String, reason: String },
}

/// Where the per-ticker files live and how to treat absent ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    #[serde(default)]
    pub missing_policy: MissingSymbolPolicy,
}

fn default_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_suffix() -> String {
    DEFAULT_SUFFIX.to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            suffix: default_suffix(),
            missing_policy: MissingSymbolPolicy::default(),
        }
    }
}

impl DataConfig {
    /// The directory source described by this section.
    pub fn source(&self) -> CsvDirSource {
        CsvDirSource::new(&self.dir).with_suffix(&self.suffix)
    }
}

/// Which table a study produces from the aligned prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    #[default]
    Prices,
    Normalized,
    DailyReturn,
    CumulativeReturn,
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransformKind::Prices => "prices",
            TransformKind::Normalized => "normalized",
            TransformKind::DailyReturn => "daily_return",
            TransformKind::CumulativeReturn => "cumulative_return",
        })
    }
}

/// One named analysis: symbols, business-day range, transform, fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Study {
    pub name: String,
    pub symbols: Vec<String>,
    /// Inclusive, `YYYY-MM-DD`.
    pub start: NaiveDate,
    /// Inclusive, `YYYY-MM-DD`.
    pub end: NaiveDate,
    #[serde(default)]
    pub field: PriceField,
    #[serde(default)]
    pub transform: TransformKind,
    /// Row used as the baseline of a `normalized` study.
    #[serde(default)]
    pub baseline_row: usize,
    #[serde(default)]
    pub fill: FillMethod,
    /// Histogram bins for `daily_return` studies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bins: Option<usize>,
}

impl Study {
    pub fn new(
        name: impl Into<String>,
        symbols: &[&str],
        start: NaiveDate,
        end: NaiveDate,
        transform: TransformKind,
    ) -> Self {
        Self {
            name: name.into(),
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            start,
            end,
            field: PriceField::Close,
            transform,
            baseline_row: 0,
            fill: FillMethod::None,
            bins: None,
        }
    }

    pub fn with_fill(mut self, fill: FillMethod) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_baseline_row(mut self, row: usize) -> Self {
        self.baseline_row = row;
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = Some(bins);
        self
    }

    /// Histogram bin count, if this study produces histograms.
    pub fn histogram_bins(&self) -> Option<usize> {
        match self.transform {
            TransformKind::DailyReturn => Some(self.bins.unwrap_or(DEFAULT_BINS)),
            _ => None,
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::Invalid {
            study: self.name.clone(),
            reason: reason.into(),
        }
    }

    /// Check the study on its own. Names double as artifact directory names,
    /// so path separators are rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("name must not be empty"));
        }
        if self.name.contains(['/', '\\']) || self.name == "." || self.name == ".." {
            return Err(self.invalid("name must not contain path separators"));
        }
        if self.symbols.is_empty() {
            return Err(self.invalid("at least one symbol is required"));
        }
        if self.start > self.end {
            return Err(self.invalid(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }
        if self.bins == Some(0) {
            return Err(self.invalid("bins must be at least 1"));
        }
        Ok(())
    }
}

/// A full study file: data section plus studies in file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default, rename = "study")]
    pub studies: Vec<Study>,
}

impl StudyConfig {
    /// Load and validate a study file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a study file from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = HashSet::new();
        for study in &self.studies {
            study.validate()?;
            if !names.insert(study.name.as_str()) {
                return Err(study.invalid("duplicate study name"));
            }
        }
        Ok(())
    }

    pub fn study(&self, name: &str) -> Option<&Study> {
        self.studies.iter().find(|s| s.name == name)
    }

    /// The five analyses of the stock notebook, reading `Data/Stocks`.
    ///
    /// Every table is interpolated for display, as the notebook plotted it.
    pub fn notebook() -> Self {
        let tech = ["googl", "msft", "aapl", "tsla", "intc"];
        let year_2016 = (date(2016, 1, 1), date(2016, 12, 31));

        let studies = vec![
            Study::new(
                "tech-prices",
                &tech,
                date(2009, 11, 10),
                date(2017, 11, 10),
                TransformKind::Prices,
            )
            .with_fill(FillMethod::Interpolate),
            Study::new(
                "tech-normalized",
                &tech,
                date(2016, 11, 10),
                date(2017, 11, 10),
                TransformKind::Normalized,
            )
            .with_baseline_row(1)
            .with_fill(FillMethod::Interpolate),
            Study::new(
                "daily-tsla-aapl",
                &["tsla", "aapl"],
                year_2016.0,
                year_2016.1,
                TransformKind::DailyReturn,
            )
            .with_bins(DEFAULT_BINS)
            .with_fill(FillMethod::Interpolate),
            Study::new(
                "daily-googl-gold",
                &["googl", "gold"],
                year_2016.0,
                year_2016.1,
                TransformKind::DailyReturn,
            )
            .with_bins(DEFAULT_BINS)
            .with_fill(FillMethod::Interpolate),
            Study::new(
                "cumulative-amzn-googl",
                &["amzn", "googl"],
                year_2016.0,
                year_2016.1,
                TransformKind::CumulativeReturn,
            )
            .with_fill(FillMethod::Interpolate),
        ];

        Self {
            data: DataConfig::default(),
            studies,
        }
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("notebook study dates are valid calendar dates")
}
