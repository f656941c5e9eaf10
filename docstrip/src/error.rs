//! Error types for strip runs.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// The kind of failure recorded in a [`StripError`].
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum StripErrorKind {
    /// The directory walk could not continue; the rest of the tree was not visited.
    Traversal,
    /// The file could not be read (or a symlink to it could not be resolved).
    Read,
    /// The path resolves outside the root (through a symlink) and was left alone.
    OutsideRoot,
    /// The file exceeded the configured maximum size.
    FileTooLarge,
    /// The file was read but could not be replaced. The original is untouched.
    Write,
    /// An exclude glob pattern could not be parsed.
    InvalidExcludePattern,
    /// A walker or worker task panicked.
    Worker,
}

/// A failure recorded during a strip run.
///
/// Failures never abort the run; they are collected into the report so that
/// one bad file does not stop the rest of the tree from being processed.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct StripError {
    /// The path involved (the root for traversal failures, the pattern for bad globs).
    pub path: PathBuf,
    /// The kind of failure.
    pub kind: StripErrorKind,
    /// Human-readable description of the failure.
    pub message: String,
}

impl StripError {
    pub(crate) fn new(path: impl Into<PathBuf>, kind: StripErrorKind, message: String) -> Self {
        Self {
            path: path.into(),
            kind,
            message,
        }
    }

    /// Format the error for human-readable output.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        let label = match self.kind {
            StripErrorKind::Traversal => "walk error",
            StripErrorKind::OutsideRoot => "outside root",
            StripErrorKind::Read | StripErrorKind::FileTooLarge => "read error",
            StripErrorKind::Write => "write error",
            StripErrorKind::InvalidExcludePattern => "config error",
            StripErrorKind::Worker => "internal error",
        };
        format!("{}: [{label}] {}", self.path.display(), self.message)
    }
}

/// Why a single file could not be rewritten.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("failed to read file: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file exceeds maximum size of {limit} bytes")]
    TooLarge { path: PathBuf, limit: u64 },

    #[error("failed to write file: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RewriteError {
    /// The file this error is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Read { path, .. } | Self::TooLarge { path, .. } | Self::Write { path, .. } => {
                path
            }
        }
    }

    /// The report category for this error.
    #[must_use]
    pub fn kind(&self) -> StripErrorKind {
        match self {
            Self::Read { .. } => StripErrorKind::Read,
            Self::TooLarge { .. } => StripErrorKind::FileTooLarge,
            Self::Write { .. } => StripErrorKind::Write,
        }
    }
}

impl From<RewriteError> for StripError {
    fn from(err: RewriteError) -> Self {
        Self::new(err.path(), err.kind(), err.to_string())
    }
}
