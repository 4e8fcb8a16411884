//! Text rendering of tables, sparklines, and histograms.
//!
//! Everything here takes already-computed values and returns a `String`;
//! nothing loads or transforms data.

use std::fmt::Write;

use stocklab_core::analysis::{ColumnChange, ColumnStats, Histogram};
use stocklab_core::Table;

const MISSING: &str = "-";
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const CELL_WIDTH: usize = 12;

fn cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:>CELL_WIDTH$.4}"),
        None => format!("{MISSING:>CELL_WIDTH$}"),
    }
}

fn write_rows(out: &mut String, table: &Table, rows: std::ops::Range<usize>) {
    for i in rows {
        let _ = write!(out, "{}", table.dates()[i]);
        for column in table.columns() {
            let _ = write!(out, " {}", cell(column.values()[i]));
        }
        out.push('\n');
    }
}

/// Table with a date column, eliding the middle when longer than
/// `head + tail` rows.
pub fn table(table: &Table, head: usize, tail: usize) -> String {
    let mut out = String::new();
    let _ = write!(out, "{:<10}", "date");
    for name in table.column_names() {
        let _ = write!(out, " {name:>CELL_WIDTH$}");
    }
    out.push('\n');

    let n = table.n_rows();
    if n <= head + tail {
        write_rows(&mut out, table, 0..n);
    } else {
        write_rows(&mut out, table, 0..head);
        let _ = writeln!(out, "... ({} rows elided)", n - head - tail);
        write_rows(&mut out, table, n - tail..n);
    }
    let _ = writeln!(out, "[{} rows x {} columns]", n, table.n_cols());
    out
}

/// Block-character sparkline, at most `width` characters wide.
///
/// Longer inputs are bucketed and each bucket shows the mean of its present
/// values. Buckets with no values render as a space.
pub fn sparkline(values: &[Option<f64>], width: usize) -> String {
    if values.is_empty() || width == 0 {
        return String::new();
    }

    let buckets: Vec<Option<f64>> = if values.len() <= width {
        values.to_vec()
    } else {
        (0..width)
            .map(|b| {
                let lo = b * values.len() / width;
                let hi = (b + 1) * values.len() / width;
                let present: Vec<f64> = values[lo..hi].iter().flatten().copied().collect();
                (!present.is_empty()).then(|| present.iter().sum::<f64>() / present.len() as f64)
            })
            .collect()
    };

    let present = buckets.iter().flatten().copied();
    let (Some(min), Some(max)) = (
        present.clone().reduce(f64::min),
        present.reduce(f64::max),
    ) else {
        return " ".repeat(buckets.len());
    };

    let top = (BLOCKS.len() - 1) as f64;
    buckets
        .iter()
        .map(|v| match v {
            Some(v) if max > min => BLOCKS[(((v - min) / (max - min)) * top).round() as usize],
            Some(_) => BLOCKS[0],
            None => ' ',
        })
        .collect()
}

/// One sparkline per column with its present min and max.
pub fn sparklines(table: &Table, width: usize) -> String {
    let label = table
        .column_names()
        .iter()
        .map(|n| n.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for column in table.columns() {
        let min = column.valid().reduce(f64::min);
        let max = column.valid().reduce(f64::max);
        let _ = writeln!(
            out,
            "{:<label$}  {} {} {}",
            column.name(),
            cell(min).trim_start(),
            sparkline(column.values(), width),
            cell(max).trim_start(),
        );
    }
    out
}

/// Horizontal bar chart of a histogram, longest bar `width` characters.
pub fn histogram(name: &str, hist: &Histogram, width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{name} ({} values, {} bins)", hist.total(), hist.bins());

    let peak = hist.counts.iter().copied().max().unwrap_or(0);
    let edges = hist.edges();
    for (i, count) in hist.counts.iter().enumerate() {
        let bar = if peak == 0 { 0 } else { count * width / peak };
        let _ = writeln!(
            out,
            "{:>10.4} .. {:>10.4} | {:<width$} {count}",
            edges[i],
            edges[i + 1],
            "#".repeat(bar),
        );
    }
    out
}

/// First value, last value and percentage change per column.
pub fn changes(changes: &[ColumnChange]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:>12} {:>12} {:>10}",
        "symbol", "first", "last", "change"
    );
    for c in changes {
        let pct = c
            .change
            .map(|v| format!("{:+.2}%", v * 100.0))
            .unwrap_or_else(|| MISSING.to_string());
        let _ = writeln!(
            out,
            "{:<10} {} {} {pct:>10}",
            c.column,
            cell(c.first),
            cell(c.last)
        );
    }
    out
}

/// Count, missing, mean, std, min and max per column.
pub fn stats(stats: &[ColumnStats]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<10} {:>6} {:>7} {:>12} {:>12} {:>12} {:>12}",
        "symbol", "count", "missing", "mean", "std", "min", "max"
    );
    for s in stats {
        let _ = writeln!(
            out,
            "{:<10} {:>6} {:>7} {} {} {} {}",
            s.column,
            s.count,
            s.missing,
            cell(s.mean),
            cell(s.std),
            cell(s.min),
            cell(s.max)
        );
    }
    out
}
