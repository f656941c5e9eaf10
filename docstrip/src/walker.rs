//! Directory traversal.
//!
//! Walks the tree under a root and hands every matching file to a callback.
//! Properties enforced here:
//! - Every candidate is canonicalized and must resolve under the canonical
//!   root; anything else is reported as [`StripErrorKind::OutsideRoot`]
//! - A symlink to a file is emitted as its canonical target, so the rewrite
//!   replaces the target and the link stays a link
//! - Each target is emitted at most once, however many links reach it
//! - Symlinked directories are only entered when `follow_links` is set
//! - Device files, pipes, and sockets are skipped
//! - The first traversal error stops the walk; nothing is retried

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::config::StripConfig;
use crate::error::{StripError, StripErrorKind};

/// Predicate over candidate file paths.
pub type PathFilter<'a> = &'a dyn Fn(&Path) -> bool;

/// What a walk produced besides the emitted paths.
#[derive(Debug, Default)]
pub struct WalkSummary {
    /// Number of paths handed to the consumer.
    pub emitted: usize,
    /// Entries that were skipped with an error, plus the traversal error
    /// that stopped the walk, if any.
    pub errors: Vec<StripError>,
}

/// Compile exclude globs, reporting the ones that do not parse.
pub fn compile_excludes(patterns: &[String]) -> (Vec<Pattern>, Vec<StripError>) {
    let mut compiled = Vec::with_capacity(patterns.len());
    let mut errors = Vec::new();

    for pat_str in patterns {
        match Pattern::new(pat_str) {
            Ok(pat) => compiled.push(pat),
            Err(e) => errors.push(StripError::new(
                pat_str,
                StripErrorKind::InvalidExcludePattern,
                format!("Invalid exclude glob pattern '{pat_str}': {e}"),
            )),
        }
    }

    (compiled, errors)
}

/// Check if a path matches any of the exclude patterns.
fn matches_exclude(path: &Path, exclude_patterns: &[Pattern]) -> bool {
    let path_str = path.to_string_lossy();
    exclude_patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
    })
}

/// Whether `path` has exactly the extension `ext` (given without a dot).
#[must_use]
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().is_some_and(|e| e == ext)
}

#[cfg(unix)]
fn is_special_file(entry: &walkdir::DirEntry) -> bool {
    use std::os::unix::fs::FileTypeExt;
    let ft = entry.file_type();
    ft.is_block_device() || ft.is_char_device() || ft.is_fifo() || ft.is_socket()
}

#[cfg(not(unix))]
fn is_special_file(_entry: &walkdir::DirEntry) -> bool {
    false
}

fn traversal_error(path: PathBuf, err: &dyn std::fmt::Display) -> StripError {
    StripError::new(
        path,
        StripErrorKind::Traversal,
        format!("Directory traversal error: {err}"),
    )
}

/// Decide which path to hand to the rewriter for `entry`.
///
/// Returns `Ok(None)` for entries that are not rewritten (a link to a
/// directory or special file, or a target already emitted).
fn resolve_target(
    entry: &walkdir::DirEntry,
    canonical_root: &Path,
    seen: &mut HashSet<PathBuf>,
) -> Result<Option<PathBuf>, StripError> {
    let path = entry.path();
    let canonical = fs::canonicalize(path).map_err(|e| {
        StripError::new(
            path,
            StripErrorKind::Read,
            format!("Failed to resolve path: {e}"),
        )
    })?;

    if !canonical.starts_with(canonical_root) {
        return Err(StripError::new(
            path,
            StripErrorKind::OutsideRoot,
            format!(
                "Resolves to {} which is outside the root directory",
                canonical.display()
            ),
        ));
    }

    if entry.path_is_symlink() && !fs::metadata(&canonical).is_ok_and(|m| m.is_file()) {
        tracing::debug!(
            path = %path.display(),
            "symlink does not point to a regular file; skipping"
        );
        return Ok(None);
    }

    if !seen.insert(canonical.clone()) {
        tracing::debug!(
            path = %path.display(),
            target = %canonical.display(),
            "target already queued; skipping"
        );
        return Ok(None);
    }

    // Links are replaced through their target; plain files keep the walked path.
    if entry.path_is_symlink() {
        Ok(Some(canonical))
    } else {
        Ok(Some(path.to_path_buf()))
    }
}

/// Walk `config.root` and call `emit` for every non-directory entry that
/// passes `filter` (all of them when `filter` is `None`) and no exclude pattern.
///
/// `emit` returns `false` to stop the walk early, e.g. when the consumer has
/// gone away.
///
/// Entries that cannot be resolved, or that resolve outside the root, are
/// recorded in the returned [`WalkSummary`] and the walk moves on. The first
/// entry the walker itself cannot read (missing root, permission denied,
/// symlink loop) is recorded as [`StripErrorKind::Traversal`] and stops the
/// walk; paths already emitted are unaffected.
pub fn walk_files<E>(
    config: &StripConfig,
    exclude: &[Pattern],
    filter: Option<PathFilter<'_>>,
    mut emit: E,
) -> WalkSummary
where
    E: FnMut(PathBuf) -> bool,
{
    let mut summary = WalkSummary::default();

    let canonical_root = match fs::canonicalize(&config.root) {
        Ok(root) => root,
        Err(e) => {
            summary.errors.push(traversal_error(config.root.clone(), &e));
            return summary;
        }
    };

    let mut walker = WalkDir::new(&config.root).follow_links(config.follow_links);
    if let Some(depth) = config.max_depth {
        walker = walker.max_depth(depth);
    }
    let walker = walker
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !matches_exclude(entry.path(), exclude));

    let mut seen = HashSet::new();
    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(walk_err) => {
                let path = walk_err
                    .path()
                    .map_or_else(|| config.root.clone(), Path::to_path_buf);
                summary.errors.push(traversal_error(path, &walk_err));
                break;
            }
        };

        if entry.file_type().is_dir() || is_special_file(&entry) {
            continue;
        }

        if filter.is_some_and(|accept| !accept(entry.path())) {
            continue;
        }

        let target = match resolve_target(&entry, &canonical_root, &mut seen) {
            Ok(Some(target)) => target,
            Ok(None) => continue,
            Err(err) => {
                tracing::warn!(path = %err.path.display(), "{}", err.message);
                summary.errors.push(err);
                continue;
            }
        };

        tracing::info!(path = %target.display(), "found file");
        summary.emitted += 1;
        if !emit(target) {
            tracing::debug!("path consumer closed; stopping walk");
            break;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn collect(config: &StripConfig, exclude: &[Pattern], ext: &str) -> Vec<PathBuf> {
        let (found, summary) = collect_with_summary(config, exclude, ext);
        assert!(summary.errors.is_empty(), "{:?}", summary.errors);
        found
    }

    fn collect_with_summary(
        config: &StripConfig,
        exclude: &[Pattern],
        ext: &str,
    ) -> (Vec<PathBuf>, WalkSummary) {
        let accept: PathFilter<'_> = &|p: &Path| has_extension(p, ext);
        let mut found = Vec::new();
        let summary = walk_files(config, exclude, Some(accept), |p| {
            found.push(p);
            true
        });
        found.sort();
        (found, summary)
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("a/b.cs"), "cs"));
        assert!(!has_extension(Path::new("a/b.csx"), "cs"));
        assert!(!has_extension(Path::new("a/cs"), "cs"));
        assert!(!has_extension(Path::new("a/b.cs.txt"), "cs"));
    }

    #[test]
    fn test_walk_filters_by_extension() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.cs"), "").unwrap();
        fs::write(tmp.path().join("b.cs"), "").unwrap();
        fs::write(tmp.path().join("c.txt"), "").unwrap();

        let config = StripConfig::new(tmp.path());
        let found = collect(&config, &[], "cs");

        assert_eq!(
            found,
            vec![tmp.path().join("a.cs"), tmp.path().join("b.cs")]
        );
    }

    #[test]
    fn test_walk_visits_nested_directories() {
        let tmp = TempDir::new().unwrap();
        let deep = tmp.path().join("one").join("two").join("three");
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("deep.cs"), "").unwrap();
        // A directory named like a match must not be emitted.
        fs::create_dir_all(tmp.path().join("dir.cs")).unwrap();

        let config = StripConfig::new(tmp.path());
        let found = collect(&config, &[], "cs");

        assert_eq!(found, vec![deep.join("deep.cs")]);
    }

    #[test]
    fn test_walk_without_filter_emits_all_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.cs"), "").unwrap();
        fs::write(tmp.path().join("b.md"), "").unwrap();

        let config = StripConfig::new(tmp.path());
        let summary = walk_files(&config, &[], None, |_| true);
        assert_eq!(summary.emitted, 2);
        assert!(summary.errors.is_empty());
    }

    #[test]
    fn test_walk_prunes_excluded_directories() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("obj")).unwrap();
        fs::write(tmp.path().join("obj").join("gen.cs"), "").unwrap();
        fs::write(tmp.path().join("keep.cs"), "").unwrap();
        fs::write(tmp.path().join("skip.Designer.cs"), "").unwrap();

        let (exclude, errors) =
            compile_excludes(&["obj".to_owned(), "*.Designer.cs".to_owned()]);
        assert!(errors.is_empty());

        let config = StripConfig::new(tmp.path());
        let found = collect(&config, &exclude, "cs");

        assert_eq!(found, vec![tmp.path().join("keep.cs")]);
    }

    #[test]
    fn test_compile_excludes_reports_invalid_pattern() {
        let (compiled, errors) = compile_excludes(&["[".to_owned(), "*.g.cs".to_owned()]);
        assert_eq!(compiled.len(), 1);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, StripErrorKind::InvalidExcludePattern);
        assert!(errors[0].message.contains("Invalid exclude glob pattern '['"));
    }

    #[test]
    fn test_walk_missing_root_is_traversal_error() {
        let tmp = TempDir::new().unwrap();
        let config = StripConfig::new(tmp.path().join("does_not_exist"));

        let summary = walk_files(&config, &[], None, |_| true);
        assert_eq!(summary.emitted, 0);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].kind, StripErrorKind::Traversal);
        assert_eq!(summary.errors[0].path, tmp.path().join("does_not_exist"));
    }

    #[test]
    fn test_walk_stops_when_consumer_refuses() {
        let tmp = TempDir::new().unwrap();
        for name in ["a.cs", "b.cs", "c.cs"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }

        let config = StripConfig::new(tmp.path());
        let summary = walk_files(&config, &[], None, |_| false);
        assert_eq!(summary.emitted, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_emits_symlink_as_its_target() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        fs::write(sub.join("real.txt"), "").unwrap();
        std::os::unix::fs::symlink(sub.join("real.txt"), tmp.path().join("link.cs")).unwrap();

        let config = StripConfig::new(tmp.path());
        let found = collect(&config, &[], "cs");

        assert_eq!(found, vec![fs::canonicalize(sub.join("real.txt")).unwrap()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_emits_each_target_once() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("real.cs"), "").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real.cs"), tmp.path().join("link.cs"))
            .unwrap();
        std::os::unix::fs::symlink("real.cs", tmp.path().join("relative.cs")).unwrap();

        for follow_links in [false, true] {
            let mut config = StripConfig::new(tmp.path());
            config.follow_links = follow_links;
            let found = collect(&config, &[], "cs");

            assert_eq!(found.len(), 1, "follow_links={follow_links}: {found:?}");
            assert_eq!(
                fs::canonicalize(&found[0]).unwrap(),
                fs::canonicalize(tmp.path().join("real.cs")).unwrap()
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_rejects_targets_outside_root() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.cs"), "").unwrap();
        let tmp = TempDir::new().unwrap();
        let link = tmp.path().join("link.cs");
        std::os::unix::fs::symlink(outside.path().join("secret.cs"), &link).unwrap();

        for follow_links in [false, true] {
            let mut config = StripConfig::new(tmp.path());
            config.follow_links = follow_links;
            let (found, summary) = collect_with_summary(&config, &[], "cs");

            assert!(found.is_empty(), "follow_links={follow_links}: {found:?}");
            assert_eq!(summary.errors.len(), 1);
            assert_eq!(summary.errors[0].kind, StripErrorKind::OutsideRoot);
            assert_eq!(summary.errors[0].path, link);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_rejects_files_inside_linked_directory_outside_root() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("lib.cs"), "").unwrap();
        let tmp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), tmp.path().join("vendor")).unwrap();

        let mut config = StripConfig::new(tmp.path());
        assert!(collect(&config, &[], "cs").is_empty());

        config.follow_links = true;
        let (found, summary) = collect_with_summary(&config, &[], "cs");
        assert!(found.is_empty());
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].kind, StripErrorKind::OutsideRoot);
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_reports_dangling_symlink() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("ok.cs"), "").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.cs"), tmp.path().join("broken.cs"))
            .unwrap();

        let config = StripConfig::new(tmp.path());
        let (found, summary) = collect_with_summary(&config, &[], "cs");

        assert_eq!(found, vec![tmp.path().join("ok.cs")]);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].kind, StripErrorKind::Read);
        assert_eq!(summary.errors[0].path, tmp.path().join("broken.cs"));
    }

    #[cfg(unix)]
    #[test]
    fn test_walk_skips_sockets() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.cs"), "").unwrap();
        let _listener =
            std::os::unix::net::UnixListener::bind(tmp.path().join("sock.cs")).unwrap();

        let config = StripConfig::new(tmp.path());
        assert_eq!(collect(&config, &[], "cs"), vec![tmp.path().join("a.cs")]);
    }

    #[test]
    fn test_walk_has_no_default_depth_limit() {
        let tmp = TempDir::new().unwrap();
        let mut deep = tmp.path().to_path_buf();
        for _ in 0..70 {
            deep.push("d");
        }
        fs::create_dir_all(&deep).unwrap();
        fs::write(deep.join("deep.cs"), "").unwrap();

        let config = StripConfig::new(tmp.path());
        assert_eq!(collect(&config, &[], "cs"), vec![deep.join("deep.cs")]);
    }

    #[test]
    fn test_walk_respects_max_depth() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("top.cs"), "").unwrap();
        fs::write(tmp.path().join("sub").join("nested.cs"), "").unwrap();

        let mut config = StripConfig::new(tmp.path());
        config.max_depth = Some(1);
        let found = collect(&config, &[], "cs");

        assert_eq!(found, vec![tmp.path().join("top.cs")]);
    }
}
