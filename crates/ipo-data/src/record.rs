//! Issuer records and risk tiers.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Risk classification assigned to each issuance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
pub enum RiskTier {
    /// Low risk
    #[display("Low")]
    Low,

    /// Moderate risk
    #[display("Moderate")]
    Moderate,

    /// High risk
    #[display("High")]
    High,
}

impl RiskTier {
    /// All tiers in reporting order.
    pub const ALL: [Self; 3] = [Self::Low, Self::Moderate, Self::High];

    /// Returns the canonical tier name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }

    /// Returns the sector summary column holding this tier's percentage.
    pub const fn pct_column(&self) -> &'static str {
        match self {
            Self::Low => "Low_pct",
            Self::Moderate => "Moderate_pct",
            Self::High => "High_pct",
        }
    }
}

impl FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "moderate" => Ok(Self::Moderate),
            "high" => Ok(Self::High),
            _ => Err(format!("Unknown risk tier: {}", s)),
        }
    }
}

/// One historical issuance.
///
/// `issuer_name` is not unique across years. Optional numeric fields are
/// empty cells in the source table; they reach the model as `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuerRecord {
    /// Issuer identifier.
    pub issuer_name: String,

    /// Sector, the grouping key for ranking and normalization.
    pub sector: String,

    /// Year of the issuance.
    pub issue_year: i32,

    /// Offer price.
    pub issue_price: Option<f64>,

    /// Close on the first day of listing.
    pub first_day_close: Option<f64>,

    /// Offering size (crore).
    pub issue_size_cr: Option<f64>,

    /// First-day listing return in percent. This is the training label.
    pub listing_return_pct: f64,

    /// GDP growth at the time of issuance.
    pub macro_gdp_growth_pct: Option<f64>,

    /// Inflation at the time of issuance.
    pub macro_inflation_pct: Option<f64>,

    /// Unemployment at the time of issuance.
    pub macro_unemployment_pct: Option<f64>,

    /// Risk classification.
    pub risk_tier: RiskTier,
}

impl IssuerRecord {
    /// Years elapsed between the issuance and `reference_year`.
    pub const fn years_since_ipo(&self, reference_year: i32) -> i32 {
        reference_year - self.issue_year
    }
}
