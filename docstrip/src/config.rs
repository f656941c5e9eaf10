//! Configuration for a strip run.
//!
//! Only the source tree and resource limits are configurable. The comment
//! marker itself is fixed (see [`crate::classify`]).

use std::path::PathBuf;

/// Extension processed when none is configured.
pub const DEFAULT_EXTENSION: &str = "cs";

/// Options for [`crate::strip_tree`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct StripConfig {
    /// Root directory to walk.
    pub root: PathBuf,
    /// File extension to process, with or without the leading dot.
    pub extension: String,
    /// Number of rewrite workers. Must be at least 1.
    pub jobs: usize,
    /// Exclude patterns (glob format), matched against the full path and the file name.
    pub exclude: Vec<String>,
    /// Whether to descend into symlinked directories.
    ///
    /// Symlinks to files are rewritten through their target either way.
    /// Targets that resolve outside the root are reported and left alone.
    pub follow_links: bool,
    /// Maximum directory traversal depth. `None` (the default) visits every
    /// descendant; symlink loops are still caught when following links.
    pub max_depth: Option<usize>,
    /// Files larger than this many bytes are left alone (default: 10 MB).
    pub max_file_size: u64,
    /// Capacity of the handoff channel between the walker and the workers.
    pub channel_capacity: usize,
}

impl StripConfig {
    /// Create a config for `root` with every other option at its default.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// The configured extension without its leading dot.
    #[must_use]
    pub fn normalized_extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }

    /// Check the options that have no meaningful fallback.
    ///
    /// # Errors
    ///
    /// Returns an error if `jobs` or `channel_capacity` is zero, or if the
    /// extension is empty.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.jobs == 0 {
            anyhow::bail!("jobs must be at least 1");
        }
        if self.channel_capacity == 0 {
            anyhow::bail!("channel capacity must be at least 1");
        }
        if self.normalized_extension().is_empty() {
            anyhow::bail!("extension must not be empty");
        }
        Ok(())
    }
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extension: DEFAULT_EXTENSION.to_owned(),
            jobs: default_jobs(),
            exclude: Vec::new(),
            follow_links: false,
            max_depth: None,
            max_file_size: 10_485_760,
            channel_capacity: 256,
        }
    }
}

/// Worker count matching the machine's available parallelism.
#[must_use]
pub fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
