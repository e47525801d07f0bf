#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ipo-priority/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod features;
pub mod loader;
pub mod record;

pub use error::{DataError, Result};
pub use features::{FEATURE_NAMES, FeatureSet, N_FEATURES};
pub use loader::{SOURCE_RENAMES, canonicalize_columns, load_issuers, records_from_frame};
pub use record::{IssuerRecord, RiskTier};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
