//! Documentation-line classification.
//!
//! A doc line is one whose first non-whitespace characters are `///`. This is
//! a prefix check on raw bytes, not lexical analysis: a `///` inside a string
//! literal that happens to start a line is still a doc line, and `//` after
//! code never is.

/// Marker that starts a documentation line.
pub const DOC_MARKER: &[u8] = b"///";

/// Whitespace skipped before the marker: space, tab, newline, carriage
/// return, form feed and vertical tab.
fn is_white(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' | b'\x0b')
}

/// Whether `line` is a documentation comment line.
///
/// Works on `&str` and `&[u8]` alike so that non-UTF-8 files can be
/// classified without lossy conversion.
#[must_use]
pub fn is_doc_line(line: impl AsRef<[u8]>) -> bool {
    let line = line.as_ref();
    line.iter()
        .position(|&c| !is_white(c))
        .is_some_and(|start| line[start..].starts_with(DOC_MARKER))
}

/// Remove every doc line from `content`.
///
/// Splits on `\n` and rejoins the kept lines with `\n`, so a trailing newline
/// survives as a final empty line. `\r` stays attached to its line.
///
/// Returns the new content and the number of lines removed.
#[must_use]
pub fn strip_doc_lines(content: &[u8]) -> (Vec<u8>, usize) {
    let mut out = Vec::with_capacity(content.len());
    let mut removed = 0;
    let mut first = true;

    for line in content.split(|&c| c == b'\n') {
        if is_doc_line(line) {
            removed += 1;
            continue;
        }
        if !first {
            out.push(b'\n');
        }
        out.extend_from_slice(line);
        first = false;
    }

    (out, removed)
}
