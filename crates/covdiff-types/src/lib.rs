//! Core types and DTOs for covdiff.
//!
//! This crate defines the values shared by every layer: line intervals,
//! per-file interval maps, coverage blocks, and the report schema.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

// ============================================================================
// Schema Constants
// ============================================================================

/// Schema identifier for the covdiff report format.
pub const SCHEMA_ID: &str = "covdiff.report.v1";

/// Tool name recorded in reports.
pub const TOOL_NAME: &str = "covdiff";

/// Name of the CI output variable carrying the percentage.
pub const OUTPUT_NAME: &str = "covdiff";

// ============================================================================
// Intervals
// ============================================================================

/// A closed, inclusive range of 1-based line numbers.
///
/// The invariant `start <= end` holds for every interval built through
/// [`Interval::new`] or [`Interval::try_new`].
///
/// # Examples
///
/// ```
/// use covdiff_types::Interval;
///
/// let iv = Interval::new(10, 15);
/// assert_eq!(iv.len(), 6);
/// assert!(iv.contains(12));
/// assert_eq!(iv.to_string(), "10-15");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    /// First line of the range.
    pub start: u32,
    /// Last line of the range (inclusive).
    pub end: u32,
}

impl Interval {
    /// Create an interval. Panics in debug builds when `start > end`.
    pub const fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Create an interval, or `None` when `start > end`.
    pub const fn try_new(start: u32, end: u32) -> Option<Self> {
        if start <= end {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// A single-line interval.
    pub const fn line(line: u32) -> Self {
        Self {
            start: line,
            end: line,
        }
    }

    /// Number of lines covered by the interval.
    pub const fn len(&self) -> u64 {
        (self.end - self.start) as u64 + 1
    }

    /// Intervals are never empty; provided for clippy's `len_without_is_empty`.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Whether `line` falls inside the interval.
    pub const fn contains(&self, line: u32) -> bool {
        self.start <= line && line <= self.end
    }

    /// Iterate over every line in the interval.
    pub fn lines(&self) -> RangeInclusive<u32> {
        self.start..=self.end
    }
}

impl From<RangeInclusive<u32>> for Interval {
    fn from(range: RangeInclusive<u32>) -> Self {
        Self::new(*range.start(), *range.end())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Map of file names to their line intervals.
///
/// Keys are diff-relative (`pkg/x.go`) or module-qualified
/// (`example.com/mod/pkg/x.go`) depending on where the map came from.
pub type FilesIntervals = BTreeMap<String, Vec<Interval>>;

/// A coverage block attributed to a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageBlock {
    /// File the block belongs to, as reported by the coverage tool.
    pub file_name: String,
    /// Lines spanned by the block.
    pub block: Interval,
    /// Number of statements in the block.
    pub statement_count: u32,
    /// How many times the block executed.
    pub execution_count: u64,
}

/// Which lines of a file are structurally in scope for measurement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StructuralScope {
    /// No structural filter applies; every changed line is in scope.
    #[default]
    Unrestricted,
    /// Only lines inside these intervals are in scope.
    Restricted(Vec<Interval>),
}

// ============================================================================
// Report Types
// ============================================================================

/// Overall gate result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerdictStatus {
    /// Percentage meets the threshold (or no threshold configured).
    Pass,
    /// Percentage is below the configured threshold.
    Fail,
}

impl VerdictStatus {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerdictStatus::Pass => "pass",
            VerdictStatus::Fail => "fail",
        }
    }
}

/// Tool identification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub version: String,
}

impl Default for Tool {
    fn default() -> Self {
        Self {
            name: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Aggregated line counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Added lines that are in scope and instrumented.
    pub measured_lines: u64,
    /// Measured lines executed at least once.
    pub covered_lines: u64,
}

/// Per-file breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    /// Repository-relative path from the diff.
    pub path: String,
    /// Key used to look the file up in the coverage profile.
    pub coverage_key: String,
    pub measured_lines: u64,
    pub covered_lines: u64,
    /// Measured lines never executed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uncovered: Vec<Interval>,
}

/// The covdiff report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub schema: String,
    pub tool: Tool,
    /// Coverage on new lines, floored to an integer percentage.
    pub coverage_pct: u32,
    /// Threshold the percentage was gated against, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_coverage_pct: Option<u32>,
    pub verdict: VerdictStatus,
    pub totals: Totals,
    pub files: Vec<FileReport>,
    /// Diff files with no statements in the coverage profile.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<String>,
}

impl Default for Report {
    fn default() -> Self {
        Self {
            schema: SCHEMA_ID.to_string(),
            tool: Tool::default(),
            coverage_pct: 100,
            min_coverage_pct: None,
            verdict: VerdictStatus::Pass,
            totals: Totals::default(),
            files: Vec::new(),
            skipped_files: Vec::new(),
        }
    }
}
