//! Integration tests for reading issuer CSV files.

use ipo_data::{DataError, FeatureSet, RiskTier, load_issuers};
use std::fs;
use tempfile::TempDir;

const SOURCE_CSV: &str = "\
issuer_name,sector,issue_year,issue_price,first_day_close,issue_size_in_cr,listing_return_%,macro_gdp_growth,macro_inflation,macro_unemployment,risk_tier
Acme Ltd,Technology,2019,320,626,638,95.6,3.9,4.8,5.3,Low
Birch Power,Energy,2021,10,14.5,,45.0,8.7,5.5,7.7,High
Cobalt Bank,Banking,2020,480,510,1200,6.25,-6.6,6.2,8.0,Moderate
";

fn write_csv(dir: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join("ipo_core_clean.csv");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_source_spellings() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(&dir, SOURCE_CSV);

    let records = load_issuers(&path).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0].sector, "Technology");
    assert_eq!(records[1].issue_size_cr, None);
    assert_eq!(records[2].risk_tier, RiskTier::Moderate);
    assert!((records[2].listing_return_pct - 6.25).abs() < 1e-12);

    let set = FeatureSet::build(&records, 2025).unwrap();
    assert_eq!(set.n_rows(), 3);
    assert!(set.features()[[1, 3]].is_nan());
}

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let err = load_issuers(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, DataError::InputMissing { .. }));
}

#[test]
fn test_missing_required_column() {
    let dir = TempDir::new().unwrap();
    let path = write_csv(
        &dir,
        "issuer_name,sector,issue_year\nAcme,Technology,2019\n",
    );
    let err = load_issuers(&path).unwrap_err();
    assert!(matches!(err, DataError::MissingColumn(_)));
}

#[test]
fn test_missing_label_value_is_fatal() {
    let dir = TempDir::new().unwrap();
    let contents = SOURCE_CSV.replace("45.0", "");
    let path = write_csv(&dir, &contents);

    let err = load_issuers(&path).unwrap_err();
    assert!(matches!(
        err,
        DataError::MissingValue { ref column, row: 1 } if column == "listing_return_pct"
    ));
}

#[test]
fn test_header_only_table_is_empty() {
    let dir = TempDir::new().unwrap();
    let header = SOURCE_CSV.lines().next().unwrap();
    let path = write_csv(&dir, &format!("{header}\n"));

    let err = load_issuers(&path).unwrap_err();
    assert!(matches!(err, DataError::EmptyInput));
}
