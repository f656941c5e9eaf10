//! Run report types.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::error::StripError;

/// What happened to a single file.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FileStatus {
    /// Doc lines were removed and the file was replaced.
    Modified,
    /// The file had no doc lines and was not written.
    Unchanged,
    /// The file could not be processed; see the matching entry in `errors`.
    Failed,
}

/// Per-file result of a run.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
    pub lines_removed: usize,
}

impl FileOutcome {
    pub(crate) fn new(path: &Path, status: FileStatus, lines_removed: usize) -> Self {
        Self {
            path: path.to_owned(),
            status,
            lines_removed,
        }
    }
}

/// Result of a strip run.
///
/// A run never fails because of a single file. Callers that care must check
/// `ok` (or `errors`) themselves.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct StripReport {
    /// Number of matching files handed to the workers.
    pub files_found: usize,
    /// Number of files that had doc lines removed.
    pub files_modified: usize,
    /// Number of files left as they were because they had no doc lines.
    pub files_unchanged: usize,
    /// Number of files that could not be processed.
    pub files_failed: usize,
    /// Total doc lines removed across all files.
    pub lines_removed: usize,
    /// Whether the walk completed and every file was processed.
    pub ok: bool,
    /// Per-file outcomes, sorted by path.
    pub files: Vec<FileOutcome>,
    /// Every failure recorded during the run, in the order it happened.
    pub errors: Vec<StripError>,
}

impl StripReport {
    /// Build the report from collected outcomes and errors.
    #[must_use]
    pub fn from_parts(mut files: Vec<FileOutcome>, errors: Vec<StripError>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));

        let count = |status: FileStatus| files.iter().filter(|f| f.status == status).count();
        let files_modified = count(FileStatus::Modified);
        let files_unchanged = count(FileStatus::Unchanged);
        let files_failed = count(FileStatus::Failed);
        let lines_removed = files.iter().map(|f| f.lines_removed).sum();

        Self {
            files_found: files.len(),
            files_modified,
            files_unchanged,
            files_failed,
            lines_removed,
            ok: errors.is_empty(),
            files,
            errors,
        }
    }

    /// Number of recorded failures.
    #[must_use]
    pub fn errors_count(&self) -> usize {
        self.errors.len()
    }
}

/// Thread-safe sink that workers push their results into.
#[derive(Debug, Default)]
pub struct Collector {
    inner: Mutex<Collected>,
}

#[derive(Debug, Default)]
struct Collected {
    files: Vec<FileOutcome>,
    errors: Vec<StripError>,
}

impl Collector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished file.
    pub fn record(&self, outcome: FileOutcome) {
        self.lock().files.push(outcome);
    }

    /// Record a failed file: a `Failed` outcome plus the error itself.
    pub fn record_failure(&self, error: StripError) {
        let mut guard = self.lock();
        guard
            .files
            .push(FileOutcome::new(&error.path, FileStatus::Failed, 0));
        guard.errors.push(error);
    }

    /// Record an error that is not tied to a processed file.
    pub fn record_error(&self, error: StripError) {
        self.lock().errors.push(error);
    }

    /// Drain everything recorded so far into a report.
    #[must_use]
    pub fn finish(&self) -> StripReport {
        let collected = std::mem::take(&mut *self.lock());
        StripReport::from_parts(collected.files, collected.errors)
    }

    // A panicking worker poisons the lock; the data is still consistent
    // because every push is a single operation.
    fn lock(&self) -> std::sync::MutexGuard<'_, Collected> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
