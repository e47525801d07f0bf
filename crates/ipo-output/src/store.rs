//! Reading published artifacts back.

use crate::artifacts::{IMPORTANCE_FILE, MANIFEST_FILE, SCORED_FILE, SECTOR_FILE};
use crate::export::{ExportError, ScoredIssuerRow, SectorSummaryRow};
use crate::manifest::RunManifest;
use chrono::{DateTime, Utc};
use ipo_model::{FeatureImportance, TrainingMode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Presence of the input and of each artifact, plus the last completion time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactStatus {
    /// Whether the input file exists, when one was given
    pub input_present: Option<bool>,
    /// Scored issuers present
    pub scored_present: bool,
    /// Sector summaries present
    pub sectors_present: bool,
    /// Feature importance present
    pub importance_present: bool,
    /// Mode of the last run, from the manifest
    pub mode: Option<TrainingMode>,
    /// Completion time of the last run, from the manifest
    pub completed_at: Option<DateTime<Utc>>,
}

impl ArtifactStatus {
    /// Whether the required artifacts can be served.
    pub const fn is_ready(&self) -> bool {
        self.scored_present && self.sectors_present
    }
}

/// Read-only view of an output directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Store over `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn require(&self, name: &'static str) -> Result<PathBuf, ExportError> {
        let path = self.dir.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ExportError::ArtifactMissing { name, path })
        }
    }

    fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ExportError> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
        Ok(rows)
    }

    /// Scored issuers as written.
    pub fn scored_issuers(&self) -> Result<Vec<ScoredIssuerRow>, ExportError> {
        Self::read_csv(&self.require(SCORED_FILE)?)
    }

    /// Sector summaries in published (priority) order.
    pub fn sector_summaries(&self) -> Result<Vec<SectorSummaryRow>, ExportError> {
        Self::read_csv(&self.require(SECTOR_FILE)?)
    }

    /// Feature importance; `None` when the last run produced none.
    pub fn feature_importance(&self) -> Result<Option<Vec<FeatureImportance>>, ExportError> {
        let path = self.dir.join(IMPORTANCE_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(Self::read_csv(&path)?))
    }

    /// Manifest of the last run.
    pub fn manifest(&self) -> Result<RunManifest, ExportError> {
        let json = fs::read_to_string(self.require(MANIFEST_FILE)?)?;
        RunManifest::from_json(&json)
    }

    /// Health signal for callers that serve the artifacts.
    ///
    /// A missing or unreadable manifest leaves `mode` and `completed_at`
    /// empty rather than failing.
    pub fn status(&self, input: Option<&Path>) -> ArtifactStatus {
        let manifest = self.manifest().ok();
        ArtifactStatus {
            input_present: input.map(Path::is_file),
            scored_present: self.dir.join(SCORED_FILE).is_file(),
            sectors_present: self.dir.join(SECTOR_FILE).is_file(),
            importance_present: self.dir.join(IMPORTANCE_FILE).is_file(),
            mode: manifest.as_ref().map(|m| m.mode),
            completed_at: manifest.map(|m| m.completed_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_artifacts() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        let err = store.scored_issuers().unwrap_err();
        assert!(matches!(
            err,
            ExportError::ArtifactMissing {
                name: SCORED_FILE,
                ..
            }
        ));
        assert!(store.sector_summaries().unwrap_err().is_artifact_missing());
        assert!(store.manifest().unwrap_err().is_artifact_missing());
        assert!(store.feature_importance().unwrap().is_none());
    }

    #[test]
    fn test_status_of_empty_directory() {
        let dir = TempDir::new().unwrap();
        let status = ArtifactStore::new(dir.path()).status(Some(&dir.path().join("in.csv")));

        assert_eq!(status.input_present, Some(false));
        assert!(!status.is_ready());
        assert!(status.completed_at.is_none());
        assert!(status.mode.is_none());
    }
}
