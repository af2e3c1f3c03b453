//! Statement archive discovery in an export directory.

use anyhow::{Context, Result};
use sift_core::{ARCHIVE_FILENAME, Archive};
use std::fs;
use std::path::{Path, PathBuf};

/// An archive found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub path: PathBuf,
    pub archive: Archive,
}

/// List `<start>-<end>-<account>-camt52v8Booked.<ext>` files in `dir`, sorted by filename.
pub fn scan_archives(dir: impl AsRef<Path>) -> Result<Vec<ArchiveFile>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))?;

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read dir {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !ARCHIVE_FILENAME.is_match(name) {
            continue;
        }
        let archive = Archive::from_filename(name);
        if archive.is_sentinel() {
            tracing::warn!(file = name, "archive name has an invalid date range");
        }
        out.push(ArchiveFile { path, archive });
    }

    out.sort_by(|a, b| a.archive.filename.cmp(&b.archive.filename));
    tracing::debug!(dir = %dir.display(), found = out.len(), "archives scanned");
    Ok(out)
}

/// Paths for a selection, in selection order. Archives not on disk are skipped.
pub fn paths_for<'a>(files: &'a [ArchiveFile], selected: &[Archive]) -> Vec<&'a Path> {
    selected
        .iter()
        .filter_map(|s| {
            files
                .iter()
                .find(|f| f.archive.filename == s.filename)
                .map(|f| f.path.as_path())
        })
        .collect()
}
