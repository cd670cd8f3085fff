//! Pure domain logic for covdiff.
//!
//! This crate implements the interval algebra, the extraction of interval
//! sets from parsed diff and coverage records, and the aggregation that turns
//! them into a "coverage on new lines" percentage. It performs no I/O.

use std::collections::BTreeMap;

use covdiff_types::{FilesIntervals, Interval, StructuralScope, VerdictStatus};

pub mod extract;
pub mod interval;

pub use extract::{
    CoverageIntervals, coverage_blocks, coverage_intervals, diff_intervals, hunk_intervals,
    repo_relative_name,
};
pub use interval::{difference, normalize, overlap, sum};

// ============================================================================
// Policy Configuration
// ============================================================================

/// Policy applied to the final percentage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
    /// Minimum percentage for a passing verdict. `None` always passes.
    pub min_coverage_pct: Option<u32>,
}

// ============================================================================
// Evaluation Input/Output
// ============================================================================

/// Input for aggregation.
#[derive(Debug, Clone, Default)]
pub struct EvalInput {
    /// Added-line intervals keyed by repository-relative path.
    pub diff_intervals: FilesIntervals,
    /// Structural scope per repository-relative path.
    /// Files without an entry are unrestricted.
    pub structural: BTreeMap<String, StructuralScope>,
    /// Coverage intervals keyed by module-qualified path.
    pub coverage: CoverageIntervals,
    /// Module path prefixed to diff paths to form coverage keys.
    pub module: String,
    pub policy: Policy,
}

/// Per-file aggregation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Repository-relative path.
    pub path: String,
    /// Key the file was looked up under in the coverage maps.
    pub coverage_key: String,
    /// Added lines in scope and instrumented (normalized).
    pub measured: Vec<Interval>,
    /// Measured lines executed at least once (normalized).
    pub covered: Vec<Interval>,
    /// Measured lines never executed (normalized).
    pub uncovered: Vec<Interval>,
}

impl FileOutcome {
    pub fn measured_lines(&self) -> u64 {
        sum(&self.measured)
    }

    pub fn covered_lines(&self) -> u64 {
        sum(&self.covered)
    }
}

/// Aggregated metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    pub measured_lines: u64,
    pub covered_lines: u64,
    /// `floor(100 * covered / measured)`, or 100 when nothing was measured.
    pub coverage_pct: u32,
}

impl Default for Metrics {
    fn default() -> Self {
        Self {
            measured_lines: 0,
            covered_lines: 0,
            coverage_pct: 100,
        }
    }
}

/// Output from aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalOutput {
    /// Files that had statements in the coverage profile, in path order.
    pub files: Vec<FileOutcome>,
    /// Diff files absent from the all-statements map.
    pub skipped_files: Vec<String>,
    pub metrics: Metrics,
    pub verdict: VerdictStatus,
}

// ============================================================================
// Evaluation Logic
// ============================================================================

/// Key under which `path` appears in a coverage profile for `module`.
///
/// # Examples
///
/// ```
/// use covdiff_domain::coverage_key;
///
/// assert_eq!(coverage_key("example.com/m", "pkg/x.go"), "example.com/m/pkg/x.go");
/// assert_eq!(coverage_key("example.com/m/", "./pkg/x.go"), "example.com/m/pkg/x.go");
/// assert_eq!(coverage_key("", "pkg/x.go"), "pkg/x.go");
/// ```
pub fn coverage_key(module: &str, path: &str) -> String {
    let module = module.trim_end_matches('/');
    let path = path.trim_start_matches("./");
    if module.is_empty() {
        path.to_string()
    } else {
        format!("{module}/{path}")
    }
}

/// Compute coverage on new lines.
///
/// For each file in the diff:
/// 1. Restrict the added lines to the file's structural scope
/// 2. Skip the file when the coverage profile has no statements for it
/// 3. Restrict further to instrumented lines
/// 4. Count measured lines, and the measured lines that were executed
///
/// The uncovered remainder of each file is kept for reporting.
pub fn evaluate(input: &EvalInput) -> EvalOutput {
    let mut files = Vec::new();
    let mut skipped_files = Vec::new();
    let mut measured_total = 0u64;
    let mut covered_total = 0u64;

    for (path, changed) in &input.diff_intervals {
        let in_scope = match input.structural.get(path) {
            Some(StructuralScope::Restricted(bodies)) => overlap(changed, bodies),
            Some(StructuralScope::Unrestricted) | None => normalize(changed),
        };

        let key = coverage_key(&input.module, path);
        let Some(statements) = input.coverage.all_statements.get(&key) else {
            skipped_files.push(path.clone());
            continue;
        };

        let measured = overlap(&in_scope, statements);
        measured_total += sum(&measured);

        let covered = match input.coverage.covered.get(&key) {
            Some(executed) => overlap(&measured, executed),
            None => Vec::new(),
        };
        covered_total += sum(&covered);

        let uncovered = difference(&measured, &covered);
        files.push(FileOutcome {
            path: path.clone(),
            coverage_key: key,
            measured,
            covered,
            uncovered,
        });
    }

    let coverage_pct = calc_coverage_pct(covered_total, measured_total);
    let verdict = determine_verdict(coverage_pct, &input.policy);

    EvalOutput {
        files,
        skipped_files,
        metrics: Metrics {
            measured_lines: measured_total,
            covered_lines: covered_total,
            coverage_pct,
        },
        verdict,
    }
}

/// Calculate the floored coverage percentage.
///
/// Returns 100 if there are no lines to evaluate.
pub fn calc_coverage_pct(covered: u64, total: u64) -> u32 {
    if total == 0 {
        return 100;
    }
    let pct = covered.min(total) * 100 / total;
    pct as u32
}

/// Determine the verdict from the percentage and policy.
fn determine_verdict(coverage_pct: u32, policy: &Policy) -> VerdictStatus {
    match policy.min_coverage_pct {
        Some(min) if coverage_pct < min => VerdictStatus::Fail,
        _ => VerdictStatus::Pass,
    }
}

// ============================================================================
// Tests
// ============================================================================
