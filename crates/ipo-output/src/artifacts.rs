//! Atomic replacement of a run's artifacts.

use crate::export::{ExportError, ExportFormat, Exporter, ScoredIssuerRow, SectorSummaryRow};
use crate::manifest::RunManifest;
use ipo_model::FeatureImportance;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Scored issuers file name.
pub const SCORED_FILE: &str = "priority_xgb_sector.csv";
/// Sector summary file name.
pub const SECTOR_FILE: &str = "sector_summary.csv";
/// Feature importance file name.
pub const IMPORTANCE_FILE: &str = "shap_mean_abs.csv";
/// Run manifest file name.
pub const MANIFEST_FILE: &str = "run_manifest.json";

/// Hidden sibling of `path` named `.{name}.{suffix}`.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{suffix}"))
}

fn write_temp(path: &Path, contents: &[u8]) -> io::Result<PathBuf> {
    let tmp = sibling_path(path, "tmp");
    let mut file = fs::File::create(&tmp)?;
    file.write_all(contents)?;
    file.sync_all()?;
    Ok(tmp)
}

/// Renames made while publishing a run, undone in reverse on failure.
#[derive(Debug, Default)]
struct Commit {
    placed: Vec<PathBuf>,
    backups: Vec<(PathBuf, PathBuf)>,
}

impl Commit {
    /// Move an existing regular file at `path` to its `.bak` sibling.
    fn set_aside(&mut self, path: &Path) -> io::Result<()> {
        if path.is_file() {
            let backup = sibling_path(path, "bak");
            fs::rename(path, &backup)?;
            self.backups.push((backup, path.to_path_buf()));
        }
        Ok(())
    }

    fn place(&mut self, tmp: &Path, path: &Path) -> io::Result<()> {
        self.set_aside(path)?;
        fs::rename(tmp, path)?;
        self.placed.push(path.to_path_buf());
        Ok(())
    }

    fn rollback(self) {
        for path in self.placed.iter().rev() {
            let _ = fs::remove_file(path);
        }
        for (backup, path) in self.backups.iter().rev() {
            if let Err(err) = fs::rename(backup, path) {
                warn!(path = %path.display(), error = %err, "could not restore artifact");
            }
        }
    }

    fn finish(self) {
        for (backup, _) in &self.backups {
            if let Err(err) = fs::remove_file(backup) {
                warn!(path = %backup.display(), error = %err, "could not remove backup");
            }
        }
    }
}

/// Everything one run publishes.
#[derive(Debug, Clone)]
pub struct ArtifactSet {
    /// Scored issuers in input order
    pub scored: Vec<ScoredIssuerRow>,
    /// Sector summaries by priority
    pub sectors: Vec<SectorSummaryRow>,
    /// Feature importance, if attribution succeeded
    pub importance: Option<Vec<FeatureImportance>>,
    /// Run metadata
    pub manifest: RunManifest,
}

/// Paths written by [`ArtifactWriter::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    /// Scored issuers
    pub scored: PathBuf,
    /// Sector summaries
    pub sectors: PathBuf,
    /// Feature importance, if written
    pub importance: Option<PathBuf>,
    /// Run manifest
    pub manifest: PathBuf,
}

/// Writes an [`ArtifactSet`] into an output directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Writer for `dir`; the directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replace the artifacts in the output directory with `set`.
    ///
    /// Every artifact is rendered before anything touches the disk, and all
    /// temporary files are written before the first rename. Replaced files
    /// are kept as `.bak` siblings until every rename succeeds; if one fails
    /// the previous artifacts are restored and the error is returned. When
    /// `set` has no importance table, a stale `shap_mean_abs.csv` is removed.
    pub fn write(&self, set: &ArtifactSet) -> Result<WrittenArtifacts, ExportError> {
        let mut rendered: Vec<(PathBuf, String)> = vec![
            (
                self.dir.join(SCORED_FILE),
                set.scored.export_to_string(ExportFormat::Csv)?,
            ),
            (
                self.dir.join(SECTOR_FILE),
                set.sectors.export_to_string(ExportFormat::Csv)?,
            ),
        ];
        let importance_path = self.dir.join(IMPORTANCE_FILE);
        if let Some(importance) = &set.importance {
            rendered.push((
                importance_path.clone(),
                importance.export_to_string(ExportFormat::Csv)?,
            ));
        }
        rendered.push((self.dir.join(MANIFEST_FILE), set.manifest.to_json()?));

        fs::create_dir_all(&self.dir)?;
        let mut staged = Vec::with_capacity(rendered.len());
        for (path, contents) in &rendered {
            match write_temp(path, contents.as_bytes()) {
                Ok(tmp) => staged.push((tmp, path)),
                Err(err) => {
                    for (tmp, _) in &staged {
                        let _ = fs::remove_file(tmp);
                    }
                    return Err(err.into());
                }
            }
        }

        let stale_importance = set.importance.is_none() && importance_path.is_file();
        let mut commit = Commit::default();
        let mut result = Ok(());
        for (tmp, path) in &staged {
            result = commit.place(tmp, path);
            if result.is_err() {
                break;
            }
            debug!(path = %path.display(), "replaced artifact");
        }
        if result.is_ok() && stale_importance {
            result = commit.set_aside(&importance_path);
        }
        if let Err(err) = result {
            commit.rollback();
            for (tmp, _) in &staged {
                let _ = fs::remove_file(tmp);
            }
            warn!(dir = %self.dir.display(), error = %err, "restored previous artifacts");
            return Err(err.into());
        }
        commit.finish();

        let importance = if set.importance.is_some() {
            Some(importance_path)
        } else {
            if stale_importance {
                info!(path = %importance_path.display(), "removed stale importance artifact");
            }
            None
        };

        let written = WrittenArtifacts {
            scored: self.dir.join(SCORED_FILE),
            sectors: self.dir.join(SECTOR_FILE),
            importance,
            manifest: self.dir.join(MANIFEST_FILE),
        };
        info!(dir = %self.dir.display(), "wrote artifacts");
        Ok(written)
    }
}
