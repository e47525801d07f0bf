#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ipo-priority/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregate;
pub mod error;
pub mod normalize;
pub mod rank;
pub mod scored;

pub use aggregate::{SectorSummary, aggregate_sectors};
pub use error::{Result, ScoringError};
pub use normalize::{CONSTANT_SECTOR_SCORE, normalize_within_sectors, round2};
pub use rank::dense_rank_within_sectors;
pub use scored::{ScoredIssuer, score_issuers};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
