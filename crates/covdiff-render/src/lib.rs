//! Rendering utilities for covdiff reports.
//!
//! This crate converts a [`Report`] into the text printed on stdout and into
//! the output variable consumed by CI runners.
//!
//! # Example
//!
//! ```rust
//! use covdiff_render::{render_summary, render_text};
//! use covdiff_types::Report;
//!
//! let report = Report::default();
//! assert_eq!(render_summary(&report), "Coverage on new lines: 100%\n");
//! assert!(render_text(&report, 10).ends_with("Coverage on new lines: 100%\n"));
//! ```

use covdiff_types::{Interval, Report};

/// Default maximum number of uncovered intervals listed per file.
pub const DEFAULT_MAX_INTERVALS: usize = 10;

/// Renders the final summary line.
pub fn render_summary(report: &Report) -> String {
    format!("Coverage on new lines: {}%\n", report.coverage_pct)
}

/// Renders per-file diagnostics followed by the summary line.
///
/// # Example Output
///
/// ```text
/// Processing file: pkg/calc/calc.go
///   measured 11 lines, covered 7
///   uncovered: 11-12, 14-15
/// Skipping file: pkg/calc/types.go (no statements in coverage profile)
/// Coverage on new lines: 63%
/// ```
pub fn render_text(report: &Report, max_intervals: usize) -> String {
    let mut output = String::new();

    for file in &report.files {
        output.push_str(&format!("Processing file: {}\n", file.path));
        output.push_str(&format!(
            "  measured {} lines, covered {}\n",
            file.measured_lines, file.covered_lines
        ));
        if !file.uncovered.is_empty() {
            output.push_str(&format!(
                "  uncovered: {}\n",
                format_intervals(&file.uncovered, max_intervals)
            ));
        }
    }

    for path in &report.skipped_files {
        output.push_str(&format!(
            "Skipping file: {path} (no statements in coverage profile)\n"
        ));
    }

    output.push_str(&render_summary(report));

    if let Some(min) = report.min_coverage_pct {
        output.push_str(&format!(
            "Minimum coverage {}%: {}\n",
            min,
            report.verdict.as_str()
        ));
    }

    output
}

/// Joins intervals as `1-3, 7`, eliding everything past `max`.
///
/// # Examples
///
/// ```rust
/// use covdiff_render::format_intervals;
/// use covdiff_types::Interval;
///
/// let ivs = [Interval::new(1, 3), Interval::line(7), Interval::new(9, 12)];
/// assert_eq!(format_intervals(&ivs, 10), "1-3, 7, 9-12");
/// assert_eq!(format_intervals(&ivs, 2), "1-3, 7 (+1 more)");
/// ```
pub fn format_intervals(intervals: &[Interval], max: usize) -> String {
    let shown: Vec<String> = intervals.iter().take(max).map(Interval::to_string).collect();
    let mut out = shown.join(", ");
    if intervals.len() > max {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("(+{} more)", intervals.len() - max));
    }
    out
}

/// Line appended to the file named by `GITHUB_OUTPUT`.
pub fn render_github_output(name: &str, value: &str) -> String {
    format!("{name}={value}\n")
}

/// Legacy workflow command for runners without `GITHUB_OUTPUT`.
pub fn render_set_output_command(name: &str, value: &str) -> String {
    format!("::set-output name={name}::{value}\n")
}
