//! # docstrip
//!
//! Removes single-line documentation comments (`///` lines) from every file
//! with a given extension under a directory tree.
//!
//! The walker runs on a blocking thread and streams matching paths through a
//! bounded channel to a fixed-size worker pool. Each worker rewrites one file
//! at a time, replacing it atomically. Failures are collected into the
//! returned [`StripReport`] instead of stopping the run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docstrip::{StripConfig, strip_tree};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let mut config = StripConfig::new("src");
//! config.extension = "cs".to_owned();
//! config.exclude = vec!["obj".to_owned()];
//!
//! let report = strip_tree(&config).await?;
//! println!("Files modified: {}", report.files_modified);
//! println!("Lines removed: {}", report.lines_removed);
//! println!("Errors: {}", report.errors_count());
//! # Ok(())
//! # }
//! ```

mod classify;
mod config;
mod error;
pub mod output;
mod pool;
mod report;
mod rewriter;
mod walker;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

pub use classify::{DOC_MARKER, is_doc_line, strip_doc_lines};
pub use config::{DEFAULT_EXTENSION, StripConfig, default_jobs};
pub use error::{RewriteError, StripError, StripErrorKind};
pub use report::{FileOutcome, FileStatus, StripReport};
pub use rewriter::rewrite_file;

use pool::WorkerPool;
use report::Collector;
use walker::{PathFilter, compile_excludes, has_extension, walk_files};

/// Strip doc lines from every matching file under `config.root`.
///
/// Returns once the walk and every rewrite have finished.
///
/// # Errors
///
/// Returns an error only for an unusable configuration (see
/// [`StripConfig::validate`]). A missing root, unreadable files and failed
/// writes are reported in [`StripReport::errors`] and never fail the call.
pub async fn strip_tree(config: &StripConfig) -> anyhow::Result<StripReport> {
    config.validate()?;

    let collector = Arc::new(Collector::new());

    let (exclude, pattern_errors) = compile_excludes(&config.exclude);
    for err in pattern_errors {
        tracing::warn!(pattern = %err.path.display(), "ignoring invalid exclude pattern");
        collector.record_error(err);
    }

    let (tx, rx) = mpsc::channel::<PathBuf>(config.channel_capacity);
    let pool = WorkerPool::spawn(
        config.jobs,
        rx,
        config.max_file_size,
        Arc::clone(&collector),
    );

    let walk_config = config.clone();
    let walker = tokio::task::spawn_blocking(move || {
        let extension = walk_config.normalized_extension().to_owned();
        let accept: PathFilter<'_> = &|path: &Path| has_extension(path, &extension);
        // `tx` moves in here and drops when the walk ends, which lets the pool drain.
        walk_files(&walk_config, &exclude, Some(accept), |path| {
            tx.blocking_send(path).is_ok()
        })
    });

    match walker.await {
        Ok(summary) => {
            tracing::debug!(
                found = summary.emitted,
                skipped = summary.errors.len(),
                "walk finished"
            );
            for err in summary.errors {
                if err.kind == StripErrorKind::Traversal {
                    tracing::warn!(path = %err.path.display(), error = %err.message, "walk aborted");
                }
                collector.record_error(err);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "walker task failed");
            collector.record_error(StripError::new(
                config.root.clone(),
                StripErrorKind::Worker,
                format!("Walker task failed: {e}"),
            ));
        }
    }

    pool.join().await;

    let report = collector.finish();
    tracing::info!(
        found = report.files_found,
        modified = report.files_modified,
        failed = report.files_failed,
        "run complete"
    );
    Ok(report)
}
