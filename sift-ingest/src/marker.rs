//! "Last processed" marker: an empty file whose mtime records the last run.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const DEFAULT_MARKER_NAME: &str = ".last_zip";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMarker {
    path: PathBuf,
}

impl ProcessedMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Marker with the default name inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DEFAULT_MARKER_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Time of the last recorded run, `None` if never run.
    pub fn last_processed(&self) -> Result<Option<SystemTime>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let meta = fs::metadata(&self.path).with_context(|| format!("stat {}", self.path.display()))?;
        Ok(Some(meta.modified()?))
    }

    /// Files modified after the last run. Without a marker every file counts as new.
    pub fn newer_files<'a>(&self, files: &'a [PathBuf]) -> Result<Vec<&'a Path>> {
        let Some(since) = self.last_processed()? else {
            return Ok(files.iter().map(PathBuf::as_path).collect());
        };

        let mut out = Vec::new();
        for f in files {
            let modified = fs::metadata(f)
                .and_then(|m| m.modified())
                .with_context(|| format!("stat {}", f.display()))?;
            if modified > since {
                out.push(f.as_path());
            }
        }
        Ok(out)
    }

    pub fn has_newer(&self, files: &[PathBuf]) -> Result<bool> {
        Ok(!self.newer_files(files)?.is_empty())
    }

    /// Record a run now, creating the marker if needed.
    pub fn touch(&self) -> Result<()> {
        self.touch_at(SystemTime::now())
    }

    pub fn touch_at(&self, when: SystemTime) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        file.set_modified(when)
            .with_context(|| format!("set mtime on {}", self.path.display()))?;
        tracing::debug!(marker = %self.path.display(), "processed marker updated");
        Ok(())
    }
}
