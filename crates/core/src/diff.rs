//! Before/after comparison of collection definitions.
//!
//! The Directus API silently ignores some attribute changes in a PATCH (a
//! unique field cannot be made non-unique, for instance). Comparing the
//! definition before and after the PATCH is the only way to notice. When the
//! two differ, both snapshots are written side by side for a human to review;
//! nothing is reconciled automatically.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::error::AdminError;

/// Result of comparing two collection snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Canonical forms are identical; nothing was written.
    Unchanged,
    /// Snapshots differ and were persisted for review.
    Changed {
        before: PathBuf,
        after: PathBuf,
        /// Lines present on only one side.
        changed_lines: usize,
    },
}

impl DiffOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, DiffOutcome::Changed { .. })
    }
}

pub struct DiffReporter {
    output_dir: PathBuf,
}

impl DiffReporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        DiffReporter {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn compare(
        &self,
        collection: &str,
        before: &Value,
        after: &Value,
    ) -> Result<DiffOutcome, AdminError> {
        let before_text = canonical(before);
        let after_text = canonical(after);

        let before_lines: Vec<&str> = before_text.lines().collect();
        let after_lines: Vec<&str> = after_text.lines().collect();

        if before_lines == after_lines {
            info!(collection, "no changes");
            return Ok(DiffOutcome::Unchanged);
        }

        let changed_lines = changed_line_count(&before_lines, &after_lines);
        let stamp = timestamp();
        // Both snapshots are written before either is kept, so a failed write
        // leaves no file behind.
        let before = self.write_snapshot(collection, &stamp, "before", &before_text)?;
        let after = self.write_snapshot(collection, &stamp, "after", &after_text)?;
        let before = keep(before)?;
        let after = match keep(after) {
            Ok(path) => path,
            Err(e) => {
                if let Err(remove) = std::fs::remove_file(&before) {
                    warn!(path = %before.display(), error = %remove, "could not remove snapshot");
                }
                return Err(e);
            }
        };

        info!(
            collection,
            changed_lines,
            before = %before.display(),
            after = %after.display(),
            "changes were applied, review the snapshots for details"
        );

        Ok(DiffOutcome::Changed {
            before,
            after,
            changed_lines,
        })
    }

    /// Write one snapshot to a uniquely named file in `output_dir`:
    /// `patch.{collection}.{yyyy-MM-dd_HHmm}.{side}.{random}.json`, timestamp in UTC.
    /// The file is deleted again when the handle drops unless it is kept.
    fn write_snapshot(
        &self,
        collection: &str,
        stamp: &str,
        side: &str,
        text: &str,
    ) -> Result<NamedTempFile, AdminError> {
        let prefix = format!("patch.{}.{}.{}.", file_safe(collection), stamp, side);
        let mut file = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".json")
            .tempfile_in(&self.output_dir)
            .map_err(|source| AdminError::Artifact {
                path: self.output_dir.clone(),
                source,
            })?;

        file.write_all(text.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .map_err(|source| AdminError::Artifact {
                path: file.path().to_path_buf(),
                source,
            })?;
        Ok(file)
    }
}

fn keep(file: NamedTempFile) -> Result<PathBuf, AdminError> {
    let (_, path) = file.keep().map_err(|e| AdminError::Artifact {
        path: e.file.path().to_path_buf(),
        source: e.error,
    })?;
    Ok(path)
}

/// Collection name usable inside a single file name component.
fn file_safe(collection: &str) -> String {
    collection
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Pretty-printed JSON with object keys in sorted order.
pub fn canonical(document: &Value) -> String {
    format!("{:#}", document)
}

/// Number of lines that appear on only one side, based on the longest
/// common subsequence of the two line lists.
fn changed_line_count(before: &[&str], after: &[&str]) -> usize {
    let mut previous = vec![0usize; after.len() + 1];
    let mut current = vec![0usize; after.len() + 1];
    for b in before {
        for (j, a) in after.iter().enumerate() {
            current[j + 1] = if b == a {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }
    let common = previous[after.len()];
    (before.len() - common) + (after.len() - common)
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!("[year]-[month]-[day]_[hour][minute]"))
        .unwrap_or_else(|_| "undated".to_string())
}
