#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ipo-priority/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod artifacts;
pub mod export;
pub mod manifest;
pub mod store;

pub use artifacts::{
    ArtifactSet, ArtifactWriter, IMPORTANCE_FILE, MANIFEST_FILE, SCORED_FILE, SECTOR_FILE,
    WrittenArtifacts,
};
pub use export::{ExportError, ExportFormat, Exporter, ScoredIssuerRow, SectorSummaryRow};
pub use manifest::{RunManifest, RunManifestBuilder};
pub use store::{ArtifactStatus, ArtifactStore};
