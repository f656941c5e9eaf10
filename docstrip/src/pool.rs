//! Fixed-size rewrite worker pool.
//!
//! Workers share the receiving half of the walker's channel. Each one takes
//! the next path, rewrites it on the blocking thread pool and records the
//! result. The pool drains once the walker drops its sender.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;

use crate::error::{StripError, StripErrorKind};
use crate::report::Collector;
use crate::rewriter::rewrite_file;

/// Path recorded for failures that belong to the pool rather than a file.
const POOL_ERROR_PATH: &str = "<worker pool>";

pub struct WorkerPool {
    workers: JoinSet<()>,
    collector: Arc<Collector>,
}

impl WorkerPool {
    /// Start `jobs` workers consuming `paths`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        jobs: usize,
        paths: mpsc::Receiver<PathBuf>,
        max_file_size: u64,
        collector: Arc<Collector>,
    ) -> Self {
        let paths = Arc::new(Mutex::new(paths));
        let mut workers = JoinSet::new();

        for id in 0..jobs {
            let paths = Arc::clone(&paths);
            let collector = Arc::clone(&collector);
            workers.spawn(worker(id, paths, max_file_size, collector));
        }

        tracing::debug!(jobs, "worker pool started");
        Self { workers, collector }
    }

    /// Wait for every worker to finish.
    pub async fn join(mut self) {
        while let Some(result) = self.workers.join_next().await {
            if let Err(e) = result {
                tracing::error!(error = %e, "worker task failed");
                self.collector.record_error(StripError::new(
                    POOL_ERROR_PATH,
                    StripErrorKind::Worker,
                    format!("Worker task failed: {e}"),
                ));
            }
        }
        tracing::debug!("worker pool drained");
    }
}

async fn worker(
    id: usize,
    paths: Arc<Mutex<mpsc::Receiver<PathBuf>>>,
    max_file_size: u64,
    collector: Arc<Collector>,
) {
    loop {
        // Hold the lock only while waiting for the next path.
        let next = paths.lock().await.recv().await;
        let Some(path) = next else {
            break;
        };

        let task_path = path.clone();
        let result =
            tokio::task::spawn_blocking(move || rewrite_file(&task_path, max_file_size)).await;

        match result {
            Ok(Ok(outcome)) => collector.record(outcome),
            Ok(Err(e)) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to rewrite file");
                collector.record_failure(e.into());
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "rewrite task failed");
                collector.record_failure(StripError::new(
                    path,
                    StripErrorKind::Worker,
                    format!("Rewrite task failed: {e}"),
                ));
            }
        }
    }
    tracing::trace!(worker = id, "worker finished");
}
