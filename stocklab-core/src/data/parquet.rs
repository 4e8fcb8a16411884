//! Parquet hand-off for tables.
//!
//! Tables leave the core as Parquet files so an external plotting tool can
//! pick them up. Layout: a `date` column (Date type) followed by one Float64
//! column per table column, nulls where the table has missing cells.
//! Writes are atomic: write to `.tmp`, then rename into place.

use super::provider::DataError;
use crate::table::Table;
use chrono::{Duration, NaiveDate};
use polars::prelude::*;
use std::fs;
use std::path::Path;

const DATE_COLUMN: &str = "date";

/// 1970-01-01, the day zero of Parquet `Date` columns.
fn epoch() -> NaiveDate {
    NaiveDate::default()
}

/// Convert a table to a Polars DataFrame.
pub fn table_to_dataframe(table: &Table) -> Result<DataFrame, DataError> {
    let days: Vec<i32> = table
        .dates()
        .iter()
        .map(|d| (*d - epoch()).num_days() as i32)
        .collect();

    let mut columns = Vec::with_capacity(table.n_cols() + 1);
    columns.push(
        Column::new(DATE_COLUMN.into(), days)
            .cast(&DataType::Date)
            .map_err(|e| DataError::Parquet(format!("date cast: {e}")))?,
    );
    for column in table.columns() {
        if column.name() == DATE_COLUMN {
            return Err(DataError::Parquet(format!(
                "column name '{DATE_COLUMN}' is reserved for the index"
            )));
        }
        columns.push(Column::new(column.name().into(), column.values().to_vec()));
    }

    DataFrame::new(columns).map_err(|e| DataError::Parquet(format!("dataframe creation: {e}")))
}

/// Convert a DataFrame in the layout above back to a table.
pub fn dataframe_to_table(df: &DataFrame) -> Result<Table, DataError> {
    let date_ca = df
        .column(DATE_COLUMN)
        .map_err(|e| DataError::Parquet(format!("column read: {e}")))?
        .date()
        .map_err(|e| DataError::Parquet(format!("date column type: {e}")))?;

    let mut dates = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = date_ca
            .get(i)
            .ok_or_else(|| DataError::Parquet(format!("null date at row {i}")))?;
        dates.push(epoch() + Duration::days(days as i64));
    }

    let mut table = Table::new(dates);
    for column in df.get_columns() {
        let name = column.name().as_str();
        if name == DATE_COLUMN {
            continue;
        }
        let values: Vec<Option<f64>> = column
            .f64()
            .map_err(|e| DataError::Parquet(format!("{name} column type: {e}")))?
            .into_iter()
            .collect();
        table.push_column(name, values)?;
    }
    Ok(table)
}

/// Write a table to `path` as Parquet.
pub fn write_table(table: &Table, path: &Path) -> Result<(), DataError> {
    let mut df = table_to_dataframe(table)?;
    let tmp_path = path.with_extension("parquet.tmp");

    let written = fs::File::create(&tmp_path)
        .map_err(|e| DataError::Parquet(format!("create file: {e}")))
        .and_then(|file| {
            ParquetWriter::new(file)
                .finish(&mut df)
                .map_err(|e| DataError::Parquet(format!("write parquet: {e}")))
        })
        .and_then(|_| {
            fs::rename(&tmp_path, path)
                .map_err(|e| DataError::Parquet(format!("atomic rename failed: {e}")))
        });

    if written.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    written
}

/// Read a table written by [`write_table`].
pub fn read_table(path: &Path) -> Result<Table, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::Parquet(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::Parquet(format!("read: {e}")))?;
    dataframe_to_table(&df)
}
