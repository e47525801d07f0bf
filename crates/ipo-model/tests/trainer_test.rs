//! End-to-end training tests over realistic issuer tables.

use ipo_data::{FEATURE_NAMES, FeatureSet, IssuerRecord, RiskTier};
use ipo_model::{
    BoosterParams, ModelTrainer, TrainerConfig, TrainingMode, explain, mean_abs_attribution,
};

fn issuer(name: &str, sector: &str, year: i32, price: f64, size: Option<f64>, ret: f64) -> IssuerRecord {
    IssuerRecord {
        issuer_name: name.to_string(),
        sector: sector.to_string(),
        issue_year: year,
        issue_price: Some(price),
        first_day_close: Some(price * (1.0 + ret / 100.0)),
        issue_size_cr: size,
        listing_return_pct: ret,
        macro_gdp_growth_pct: Some(4.0 + f64::from(year - 2015) * 0.3),
        macro_inflation_pct: Some(5.5),
        macro_unemployment_pct: Some(7.0),
        risk_tier: RiskTier::High,
    }
}

fn table() -> Vec<IssuerRecord> {
    let sectors = ["Technology", "Energy", "Banking", "Healthcare", "Retail"];
    let mut records = Vec::new();
    for (s, sector) in sectors.iter().enumerate() {
        for i in 0..6 {
            let year = 2016 + i;
            let price = 80.0 + 25.0 * f64::from(i) + 3.0 * s as f64;
            // Missing sizes exercise the NaN routing
            let size = (i % 3 != 0).then_some(price * 4.0);
            let ret = 2.0 * f64::from(i) + s as f64 - 4.0;
            records.push(issuer(&format!("{sector} {i}"), sector, year, price, size, ret));
        }
    }
    records
}

fn fast_config() -> TrainerConfig {
    TrainerConfig {
        ranker: BoosterParams {
            n_estimators: 40,
            ..BoosterParams::ranker_default()
        },
        regressor: BoosterParams {
            n_estimators: 40,
            ..BoosterParams::regressor_default()
        },
        ..Default::default()
    }
}

#[test]
fn test_ranker_scores_full_matrix() {
    let set = FeatureSet::build(&table(), 2025).unwrap();
    let trained = ModelTrainer::new(fast_config()).unwrap().train(&set).unwrap();

    assert_eq!(trained.mode, TrainingMode::Ranker);
    assert_eq!(trained.raw_scores.len(), 30);
    // 5 sectors over 3 folds: sizes 6 each, validation fold holds 2 sectors
    assert_eq!(trained.report.n_validation, 12);
    assert_eq!(trained.report.n_train, 18);
    let ndcg = trained.report.validation_metric.unwrap();
    assert!((0.0..=1.0).contains(&ndcg));
}

#[test]
fn test_every_sector_singleton_uses_regressor() {
    let records: Vec<_> = ["Technology", "Energy", "Banking", "Healthcare"]
        .iter()
        .enumerate()
        .map(|(i, s)| issuer(s, s, 2017 + i as i32, 100.0 + i as f64, Some(500.0), i as f64 * 3.0))
        .collect();
    let set = FeatureSet::build(&records, 2025).unwrap();
    let trained = ModelTrainer::new(fast_config()).unwrap().train(&set).unwrap();

    assert_eq!(trained.mode, TrainingMode::Regressor);
    assert!(trained.report.fallback_reason.is_some());
    assert_eq!(trained.raw_scores.len(), 4);
}

#[test]
fn test_importance_covers_every_feature() {
    let set = FeatureSet::build(&table(), 2025).unwrap();
    let trained = ModelTrainer::new(fast_config()).unwrap().train(&set).unwrap();

    let importance = explain(&trained.model, set.features(), set.feature_names()).unwrap();
    assert_eq!(importance.len(), FEATURE_NAMES.len());
    assert!(importance.iter().all(|f| f.mean_abs_shap >= 0.0 && f.mean_abs_shap.is_finite()));
    for name in FEATURE_NAMES {
        assert!(importance.iter().any(|f| f.feature == name));
    }

    let again = mean_abs_attribution(&trained.model, set.features(), set.feature_names()).unwrap();
    assert_eq!(importance, again);
}
