//! Single-file rewrite.
//!
//! Reads a file with a bounded read, strips doc lines and replaces the file
//! atomically: the new content is written to a temporary file next to the
//! original and renamed over it. A failure at any step leaves the original
//! untouched.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::classify::strip_doc_lines;
use crate::error::RewriteError;
use crate::report::{FileOutcome, FileStatus};

/// Read `path` completely, refusing files larger than `max_file_size`.
///
/// Uses `Read::take` so the size check and the read are the same operation.
///
/// # Errors
///
/// Returns [`RewriteError::Read`] on I/O failure and
/// [`RewriteError::TooLarge`] if the file exceeds the limit.
pub fn read_file_bounded(path: &Path, max_file_size: u64) -> Result<Vec<u8>, RewriteError> {
    let read_err = |source| RewriteError::Read {
        path: path.to_owned(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;

    // Read at most max_file_size + 1 bytes to detect oversized files
    let mut buffer = Vec::new();
    file.take(max_file_size.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(read_err)?;

    if buffer.len() as u64 > max_file_size {
        return Err(RewriteError::TooLarge {
            path: path.to_owned(),
            limit: max_file_size,
        });
    }

    Ok(buffer)
}

/// Replace the contents of `path` with `content` via temp file and rename.
///
/// The temporary file lives in the same directory so the rename never
/// crosses filesystems, and it takes over the original's permissions.
///
/// # Errors
///
/// Returns [`RewriteError::Write`] if any step fails. The temporary file is
/// removed on failure and the original is left as it was.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<(), RewriteError> {
    let write_err = |source| RewriteError::Write {
        path: path.to_owned(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let permissions = std::fs::metadata(path).map_err(write_err)?.permissions();

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(content).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;
    tmp.as_file().set_permissions(permissions).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    Ok(())
}

/// Strip doc lines from one file in place.
///
/// Files without doc lines are not written at all.
///
/// # Errors
///
/// Returns the [`RewriteError`] of the step that failed; the file is then
/// unmodified.
pub fn rewrite_file(path: &Path, max_file_size: u64) -> Result<FileOutcome, RewriteError> {
    let content = read_file_bounded(path, max_file_size)?;
    let (stripped, lines_removed) = strip_doc_lines(&content);

    if lines_removed == 0 {
        tracing::debug!(path = %path.display(), "no doc lines");
        return Ok(FileOutcome::new(path, FileStatus::Unchanged, 0));
    }

    write_atomic(path, &stripped)?;
    tracing::debug!(path = %path.display(), lines_removed, "rewrote file");
    Ok(FileOutcome::new(path, FileStatus::Modified, lines_removed))
}
