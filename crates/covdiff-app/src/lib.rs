//! Application orchestration for covdiff.
//!
//! This crate provides the high-level `check` function that runs the whole
//! "coverage on new lines" pipeline:
//!
//! 1. Parse the diff and extract added-line intervals
//! 2. Ask the structure provider which lines of each file are in scope
//! 3. Parse the Go coverage profile and split it into covered and
//!    all-statement intervals
//! 4. Aggregate the percentage and apply the threshold policy
//! 5. Build the report and its text rendering
//!
//! # Example
//!
//! ```rust
//! use covdiff_app::{CheckRequest, check};
//! use covdiff_ports::Unfiltered;
//!
//! let request = CheckRequest {
//!     diff_text: "diff --git a/x.go b/x.go\n--- /dev/null\n+++ b/x.go\n@@ -0,0 +1,2 @@\n+a\n+b\n"
//!         .to_string(),
//!     coverage_text: "mode: set\nx.go:1.1,2.2 2 1\n".to_string(),
//!     ..Default::default()
//! };
//!
//! let result = check(&request, &|_: &str| false, &Unfiltered).unwrap();
//! assert_eq!(result.report.coverage_pct, 100);
//! assert_eq!(result.exit_code, 0);
//! ```

use std::collections::BTreeMap;

use covdiff_adapters_coverage::{CoverError, parse_profiles};
use covdiff_adapters_diff::{DiffError, parse_multi_file_diff};
use covdiff_domain::{
    EvalInput, EvalOutput, Policy, coverage_intervals, diff_intervals, evaluate,
};
use covdiff_ports::{PathFilter, StructureProvider};
use covdiff_render::{DEFAULT_MAX_INTERVALS, render_text};
use covdiff_types::{FileReport, Report, SCHEMA_ID, Tool, Totals, VerdictStatus};
use thiserror::Error;
use tracing::{debug, info};

// ============================================================================
// Request and Result Types
// ============================================================================

/// Request for a coverage check operation.
#[derive(Debug, Clone, Default)]
pub struct CheckRequest {
    /// Unified diff of the change.
    pub diff_text: String,
    /// Go coverage profile content.
    pub coverage_text: String,
    /// Module path prefixed to diff names to form coverage keys.
    pub module: String,
    /// Minimum percentage for a passing verdict.
    pub min_coverage_pct: Option<u32>,
}

/// Result of a coverage check operation.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub report: Report,
    /// Per-file diagnostics and the summary line.
    pub text: String,
    /// Exit code for the CLI.
    /// - 0: pass
    /// - 2: below the configured minimum
    /// - 1: tool/runtime error (not returned here, only via AppError)
    pub exit_code: i32,
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur during the check operation.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to parse the diff.
    #[error("failed to parse diff: {0}")]
    DiffParse(String),

    /// Failed to parse the coverage profile.
    #[error("failed to parse coverage profile: {0}")]
    CoverageParse(String),

    /// The structure provider rejected a source file.
    #[error("failed to read functions of {path}: {message}")]
    Structure { path: String, message: String },
}

impl From<DiffError> for AppError {
    fn from(e: DiffError) -> Self {
        AppError::DiffParse(e.to_string())
    }
}

impl From<CoverError> for AppError {
    fn from(e: CoverError) -> Self {
        AppError::CoverageParse(e.to_string())
    }
}

// ============================================================================
// Main Check Function
// ============================================================================

/// Run a coverage-on-new-lines check.
///
/// `filter` is applied to both diff names and coverage names. `structure`
/// is consulted once for every file that survives the filter.
///
/// # Errors
///
/// Returns `AppError` if either input fails to parse or the structure
/// provider fails for a file.
pub fn check<F, S>(request: &CheckRequest, filter: &F, structure: &S) -> Result<CheckResult, AppError>
where
    F: PathFilter + ?Sized,
    S: StructureProvider + ?Sized,
{
    let files = parse_multi_file_diff(&request.diff_text)?;
    let diff = diff_intervals(&files, filter);
    info!(files = files.len(), measured_files = diff.len(), "parsed diff");

    let mut structural = BTreeMap::new();
    for path in diff.keys() {
        let scope = structure
            .structural_scope(path)
            .map_err(|message| AppError::Structure {
                path: path.clone(),
                message,
            })?;
        structural.insert(path.clone(), scope);
    }

    let profiles = parse_profiles(&request.coverage_text)?;
    let coverage = coverage_intervals(&profiles, filter);
    info!(
        profiles = profiles.len(),
        blocks = profiles.iter().map(|p| p.blocks.len()).sum::<usize>(),
        "parsed coverage profile"
    );

    let output = evaluate(&EvalInput {
        diff_intervals: diff,
        structural,
        coverage,
        module: request.module.clone(),
        policy: Policy {
            min_coverage_pct: request.min_coverage_pct,
        },
    });

    for file in &output.files {
        debug!(
            path = %file.path,
            key = %file.coverage_key,
            measured = file.measured_lines(),
            covered = file.covered_lines(),
            uncovered = ?file.uncovered,
            "processed file"
        );
    }
    for path in &output.skipped_files {
        debug!(path = %path, "no statements in coverage profile");
    }

    let report = build_report(&output, request.min_coverage_pct);
    info!(
        pct = report.coverage_pct,
        measured = report.totals.measured_lines,
        covered = report.totals.covered_lines,
        verdict = report.verdict.as_str(),
        "coverage on new lines"
    );

    let text = render_text(&report, DEFAULT_MAX_INTERVALS);
    let exit_code = match report.verdict {
        VerdictStatus::Pass => 0,
        VerdictStatus::Fail => 2,
    };

    Ok(CheckResult {
        report,
        text,
        exit_code,
    })
}

/// Build the serializable report from an evaluation.
pub fn build_report(output: &EvalOutput, min_coverage_pct: Option<u32>) -> Report {
    Report {
        schema: SCHEMA_ID.to_string(),
        tool: Tool::default(),
        coverage_pct: output.metrics.coverage_pct,
        min_coverage_pct,
        verdict: output.verdict,
        totals: Totals {
            measured_lines: output.metrics.measured_lines,
            covered_lines: output.metrics.covered_lines,
        },
        files: output
            .files
            .iter()
            .map(|f| FileReport {
                path: f.path.clone(),
                coverage_key: f.coverage_key.clone(),
                measured_lines: f.measured_lines(),
                covered_lines: f.covered_lines(),
                uncovered: f.uncovered.clone(),
            })
            .collect(),
        skipped_files: output.skipped_files.clone(),
    }
}

// ============================================================================
// Tests
// ============================================================================
