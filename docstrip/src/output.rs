//! Shared output formatting for strip reports.
//!
//! Provides JSON and plain-text formatters for `StripReport`.
//! Progress output is the logger's job; these run once at the end.

use std::io::Write;

use crate::report::{FileStatus, StripReport};

/// Format a `StripReport` as JSON to a writer.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(report: &StripReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Format a `StripReport` as human-readable plain text to a writer.
///
/// Lists every modified file with its removed-line count, then every error.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(report: &StripReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer, "  DOC COMMENT STRIP")?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer)?;
    writeln!(writer, "  Files found:      {}", report.files_found)?;
    writeln!(writer, "  Files modified:   {}", report.files_modified)?;
    writeln!(writer, "  Files unchanged:  {}", report.files_unchanged)?;
    writeln!(writer, "  Files failed:     {}", report.files_failed)?;
    writeln!(writer, "  Lines removed:    {}", report.lines_removed)?;
    writeln!(writer)?;

    let modified: Vec<_> = report
        .files
        .iter()
        .filter(|f| f.status == FileStatus::Modified)
        .collect();
    if !modified.is_empty() {
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  MODIFIED FILES")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        for file in modified {
            writeln!(
                writer,
                "{} (-{} line(s))",
                file.path.display(),
                file.lines_removed
            )?;
        }
        writeln!(writer)?;
    }

    if !report.errors.is_empty() {
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  ERRORS")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        for err in &report.errors {
            writeln!(writer, "{}", err.format_human_readable())?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "{}", "=".repeat(80))?;
    if report.ok {
        writeln!(
            writer,
            "\u{2713} {} of {} file(s) rewritten",
            report.files_modified, report.files_found
        )?;
    } else {
        writeln!(
            writer,
            "\u{2717} {} error(s); {} of {} file(s) rewritten",
            report.errors_count(),
            report.files_modified,
            report.files_found
        )?;
    }
    writeln!(writer, "{}", "=".repeat(80))?;

    Ok(())
}
