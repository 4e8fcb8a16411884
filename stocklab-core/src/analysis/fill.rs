//! Explicit gap filling. Alignment never fills; callers opt in here.

use crate::table::Table;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How to fill missing cells before display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMethod {
    /// Leave missing cells alone.
    #[default]
    None,
    /// Carry the last present value forward.
    Forward,
    /// Linear interpolation between present neighbours.
    Interpolate,
}

impl FillMethod {
    pub fn apply(&self, table: &Table) -> Table {
        match self {
            FillMethod::None => table.clone(),
            FillMethod::Forward => forward_fill(table),
            FillMethod::Interpolate => interpolate(table),
        }
    }
}

impl fmt::Display for FillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FillMethod::None => "none",
            FillMethod::Forward => "forward",
            FillMethod::Interpolate => "interpolate",
        })
    }
}

impl FromStr for FillMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(FillMethod::None),
            "forward" | "pad" | "ffill" => Ok(FillMethod::Forward),
            "interpolate" | "linear" => Ok(FillMethod::Interpolate),
            other => Err(format!(
                "unknown fill method '{other}'. Valid: none, forward, interpolate"
            )),
        }
    }
}

/// Carry the last present value forward. Leading gaps stay missing.
pub fn forward_fill(table: &Table) -> Table {
    table.map_columns(|values| {
        let mut last = None;
        values
            .iter()
            .map(|v| {
                if v.is_some() {
                    last = *v;
                }
                last
            })
            .collect()
    })
}

/// Linear interpolation by row position.
///
/// Gaps between two present values are filled on the straight line joining
/// them. Leading gaps stay missing; trailing gaps repeat the last present
/// value.
pub fn interpolate(table: &Table) -> Table {
    table.map_columns(|values| {
        let mut out = values.to_vec();
        let mut prev: Option<(usize, f64)> = None;

        for (i, v) in values.iter().enumerate() {
            let Some(cur) = *v else { continue };
            if let Some((p, pv)) = prev {
                let span = (i - p) as f64;
                for (k, cell) in out.iter_mut().enumerate().take(i).skip(p + 1) {
                    *cell = Some(pv + (cur - pv) * (k - p) as f64 / span);
                }
            }
            prev = Some((i, cur));
        }

        if let Some((p, pv)) = prev {
            for cell in out.iter_mut().skip(p + 1) {
                *cell = Some(pv);
            }
        }
        out
    })
}
