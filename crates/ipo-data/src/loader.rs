//! Issuer table loading.
//!
//! Reads the issuer CSV with polars, maps source-specific column spellings
//! onto canonical names and coerces each column into [`IssuerRecord`] fields.
//! Rows are never dropped: any coercion failure aborts the load.

use crate::error::{DataError, Result};
use crate::record::{IssuerRecord, RiskTier};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Source spellings and the canonical names they are renamed to.
pub const SOURCE_RENAMES: [(&str, &str); 5] = [
    ("listing_return_%", "listing_return_pct"),
    ("issue_size_in_cr", "issue_size_cr"),
    ("macro_gdp_growth", "macro_gdp_growth_pct"),
    ("macro_inflation", "macro_inflation_pct"),
    ("macro_unemployment", "macro_unemployment_pct"),
];

/// Load every issuer record from a CSV file.
///
/// # Errors
///
/// Returns [`DataError::InputMissing`] if the file does not exist, and a
/// column-level error if a required column is missing or cannot be coerced.
pub fn load_issuers(path: &Path) -> Result<Vec<IssuerRecord>> {
    if !path.exists() {
        return Err(DataError::InputMissing {
            path: path.to_path_buf(),
        });
    }

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!(rows = df.height(), columns = df.width(), "read issuer csv");

    canonicalize_columns(&mut df)?;
    let records = records_from_frame(&df)?;

    info!(
        path = %path.display(),
        issuers = records.len(),
        "loaded issuer table"
    );
    Ok(records)
}

/// Rename source-specific spellings to canonical column names.
///
/// A source column is left untouched when its canonical name already exists.
pub fn canonicalize_columns(df: &mut DataFrame) -> Result<()> {
    for (source, canonical) in SOURCE_RENAMES {
        if df.column(source).is_ok() && df.column(canonical).is_err() {
            df.rename(source, canonical.into())?;
            debug!(source, canonical, "renamed column");
        }
    }
    Ok(())
}

/// Convert a canonicalized frame into issuer records, one per row.
pub fn records_from_frame(df: &DataFrame) -> Result<Vec<IssuerRecord>> {
    if df.height() == 0 {
        return Err(DataError::EmptyInput);
    }

    let issuer_names = require("issuer_name", string_column(df, "issuer_name")?)?;
    let sectors = require("sector", string_column(df, "sector")?)?;
    let issue_years = year_column(df, "issue_year")?;
    let issue_prices = float_column(df, "issue_price")?;
    let first_day_closes = float_column(df, "first_day_close")?;
    let issue_sizes = float_column(df, "issue_size_cr")?;
    let labels = require("listing_return_pct", float_column(df, "listing_return_pct")?)?;
    let gdp = float_column(df, "macro_gdp_growth_pct")?;
    let inflation = float_column(df, "macro_inflation_pct")?;
    let unemployment = float_column(df, "macro_unemployment_pct")?;
    let tiers = tier_column(df, "risk_tier")?;

    let records = (0..df.height())
        .map(|row| IssuerRecord {
            issuer_name: issuer_names[row].clone(),
            sector: sectors[row].clone(),
            issue_year: issue_years[row],
            issue_price: issue_prices[row],
            first_day_close: first_day_closes[row],
            issue_size_cr: issue_sizes[row],
            listing_return_pct: labels[row],
            macro_gdp_growth_pct: gdp[row],
            macro_inflation_pct: inflation[row],
            macro_unemployment_pct: unemployment[row],
            risk_tier: tiers[row],
        })
        .collect();

    Ok(records)
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name)
        .map_err(|_| DataError::MissingColumn(name.to_string()))
}

/// Cast a column to `f64`.
///
/// Empty cells stay `None`; populated cells that do not parse are an error.
fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let source = column(df, name)?.as_materialized_series();
    let was_null = source.is_null();
    let cast = source.cast(&DataType::Float64)?;

    cast.f64()?
        .iter()
        .zip(was_null.iter())
        .enumerate()
        .map(|(row, (value, was_null))| match (value, was_null) {
            (None, Some(false)) => Err(DataError::NonNumeric {
                column: name.to_string(),
                row,
            }),
            (value, _) => Ok(value.filter(|v| !v.is_nan())),
        })
        .collect()
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let cast = column(df, name)?
        .as_materialized_series()
        .cast(&DataType::String)?;

    Ok(cast
        .str()?
        .iter()
        .map(|value| {
            value
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .collect())
}

fn year_column(df: &DataFrame, name: &str) -> Result<Vec<i32>> {
    require(name, float_column(df, name)?)?
        .into_iter()
        .enumerate()
        .map(|(row, year)| {
            if year.fract() == 0.0 && year.abs() < f64::from(i32::MAX) {
                Ok(year as i32)
            } else {
                Err(DataError::NonNumeric {
                    column: name.to_string(),
                    row,
                })
            }
        })
        .collect()
}

fn tier_column(df: &DataFrame, name: &str) -> Result<Vec<RiskTier>> {
    require(name, string_column(df, name)?)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value
                .parse::<RiskTier>()
                .map_err(|_| DataError::InvalidRiskTier { row, value })
        })
        .collect()
}

/// Reject empty cells in a column that must be fully populated.
fn require<T>(name: &str, values: Vec<Option<T>>) -> Result<Vec<T>> {
    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| DataError::MissingValue {
                column: name.to_string(),
                row,
            })
        })
        .collect()
}
