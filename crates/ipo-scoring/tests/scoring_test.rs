//! Properties of the scored and sector tables over a mixed issuer table.

use ipo_data::{IssuerRecord, RiskTier};
use ipo_scoring::{aggregate_sectors, score_issuers};
use std::collections::{BTreeMap, BTreeSet};

fn record(name: &str, sector: &str, ret: f64, tier: RiskTier) -> IssuerRecord {
    IssuerRecord {
        issuer_name: name.to_string(),
        sector: sector.to_string(),
        issue_year: 2019,
        issue_price: Some(200.0),
        first_day_close: Some(200.0 * (1.0 + ret / 100.0)),
        issue_size_cr: Some(1500.0),
        listing_return_pct: ret,
        macro_gdp_growth_pct: Some(3.9),
        macro_inflation_pct: Some(4.8),
        macro_unemployment_pct: Some(5.3),
        risk_tier: tier,
    }
}

fn table() -> (Vec<IssuerRecord>, Vec<f64>) {
    let rows = [
        ("t1", "Technology", 95.6, RiskTier::Low, 0.81),
        ("e1", "Energy", 45.0, RiskTier::High, -0.20),
        ("t2", "Technology", 12.0, RiskTier::Moderate, 0.33),
        ("b1", "Banking", 6.25, RiskTier::Moderate, 0.05),
        ("t3", "Technology", -8.0, RiskTier::High, 0.33),
        ("e2", "Energy", 3.0, RiskTier::High, -0.20),
        ("t4", "Technology", 40.0, RiskTier::Low, -1.40),
    ];
    let records = rows
        .iter()
        .map(|(n, s, r, t, _)| record(n, s, *r, *t))
        .collect();
    let raw = rows.iter().map(|row| row.4).collect();
    (records, raw)
}

#[test]
fn test_normalization_and_rank_properties() {
    let (records, raw) = table();
    let scored = score_issuers(&records, &raw).unwrap();

    let mut by_sector: BTreeMap<&str, Vec<(f64, u32)>> = BTreeMap::new();
    for s in &scored {
        by_sector
            .entry(s.record.sector.as_str())
            .or_default()
            .push((s.priority_score_0_100, s.sector_rank));
    }

    // Technology has distinct raw scores: extremes hit the bounds
    let tech = &by_sector["Technology"];
    let max = tech.iter().map(|t| t.0).fold(f64::MIN, f64::max);
    let min = tech.iter().map(|t| t.0).fold(f64::MAX, f64::min);
    assert_eq!(max, 100.0);
    assert_eq!(min, 0.0);

    // Energy is constant, Banking a singleton
    assert!(by_sector["Energy"].iter().all(|t| *t == (50.0, 1)));
    assert_eq!(by_sector["Banking"], vec![(50.0, 1)]);

    for members in by_sector.values() {
        let distinct: BTreeSet<u64> = members.iter().map(|t| t.0.to_bits()).collect();
        let ranks: BTreeSet<u32> = members.iter().map(|t| t.1).collect();
        assert_eq!(ranks, (1..=distinct.len() as u32).collect::<BTreeSet<u32>>());
        for a in members {
            for b in members {
                if a.0 == b.0 {
                    assert_eq!(a.1, b.1);
                }
            }
        }
    }
}

#[test]
fn test_sector_table_properties() {
    let (records, raw) = table();
    let scored = score_issuers(&records, &raw).unwrap();
    let summaries = aggregate_sectors(&scored).unwrap();

    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries.iter().map(|s| s.n_ipo).sum::<usize>(), records.len());
    assert!(
        summaries
            .windows(2)
            .all(|w| w[0].sector_priority >= w[1].sector_priority)
    );
    for s in &summaries {
        let closure = s.low_pct + s.moderate_pct + s.high_pct;
        assert!((closure - 100.0).abs() < 1e-9, "{} sums to {closure}", s.sector);
    }
}
