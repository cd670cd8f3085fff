//! Shared port traits and boundary DTOs for covdiff's hexagonal architecture.
//!
//! The parsers in the adapter crates produce the records defined here; the
//! domain consumes them without knowing anything about textual formats.

use covdiff_types::StructuralScope;

// ============================================================================
// Diff Records
// ============================================================================

/// How a hunk body line relates to the new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Present only in the new file (`+`).
    Added,
    /// Present only in the original file (`-`).
    Removed,
    /// Present in both files (` `).
    Context,
}

/// A single line of a hunk body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkLine {
    pub kind: LineKind,
    /// Line content without the leading marker.
    pub text: String,
}

impl HunkLine {
    pub fn added(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Added,
            text: text.into(),
        }
    }

    pub fn removed(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Removed,
            text: text.into(),
        }
    }

    pub fn context(text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Context,
            text: text.into(),
        }
    }
}

/// A contiguous change region of a file diff.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hunk {
    pub orig_start_line: u32,
    pub orig_lines: u32,
    /// First line of the hunk in the new file.
    pub new_start_line: u32,
    pub new_lines: u32,
    /// Text after the closing `@@`, usually the enclosing function.
    pub section: String,
    pub lines: Vec<HunkLine>,
}

/// One file's portion of a multi-file diff.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileDiff {
    /// Original name as written in the diff (e.g. `a/pkg/x.go`).
    pub orig_name: String,
    /// New name as written in the diff (e.g. `b/pkg/x.go`, or `/dev/null`).
    pub new_name: String,
    /// Whether the diff reported binary content for this file.
    pub is_binary: bool,
    pub hunks: Vec<Hunk>,
}

// ============================================================================
// Coverage Records
// ============================================================================

/// A measured statement block from a coverage profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileBlock {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    pub num_stmt: u32,
    pub count: u64,
}

/// All blocks reported for one file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoverageProfile {
    /// File name as reported (module-qualified for Go profiles).
    pub file_name: String,
    /// Counting mode from the profile header (`set`, `count`, `atomic`).
    pub mode: String,
    pub blocks: Vec<ProfileBlock>,
}

// ============================================================================
// Ports
// ============================================================================

/// Port deciding which files take part in the computation.
pub trait PathFilter {
    /// Returns `true` when `path` must be excluded from every interval map.
    fn should_skip(&self, path: &str) -> bool;
}

impl<F> PathFilter for F
where
    F: Fn(&str) -> bool,
{
    fn should_skip(&self, path: &str) -> bool {
        self(path)
    }
}

/// Port yielding the structurally in-scope lines of a source file.
pub trait StructureProvider {
    /// Returns the scope for the repository-relative `path`.
    fn structural_scope(&self, path: &str) -> Result<StructuralScope, String>;
}

/// Provider that applies no structural filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unfiltered;

impl StructureProvider for Unfiltered {
    fn structural_scope(&self, _path: &str) -> Result<StructuralScope, String> {
        Ok(StructuralScope::Unrestricted)
    }
}
