//! Diff parsing adapters for covdiff.
//!
//! This crate provides a unified diff parser that turns multi-file patch text
//! (as produced by `git diff`) into [`FileDiff`] records with their hunks.
//! Interpreting the hunks is left to the domain.

use covdiff_ports::{FileDiff, Hunk, HunkLine};
use thiserror::Error;

/// Name used by diffs for the missing side of an added or deleted file.
pub const DEV_NULL: &str = "/dev/null";

/// Errors that can occur during diff parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// The diff format is invalid or malformed.
    #[error("invalid diff format at line {line}: {message}")]
    InvalidFormat { line: usize, message: String },
}

impl DiffError {
    fn invalid(line: usize, message: impl Into<String>) -> Self {
        DiffError::InvalidFormat {
            line,
            message: message.into(),
        }
    }
}

// ============================================================================
// Diff Parsing
// ============================================================================

/// Parse a unified multi-file diff into per-file records.
///
/// Hunk bodies are consumed according to the line counts in their headers,
/// so a body line that does not start with `+`, `-`, ` ` or `\` is an error.
/// An empty line inside a hunk is treated as a context line whose leading
/// space was stripped. Text before the first file header is ignored.
///
/// # Errors
///
/// Returns [`DiffError::InvalidFormat`] for a malformed hunk header, a hunk
/// outside of any file, or an unexpected line inside a hunk.
///
/// # Examples
///
/// ```
/// use covdiff_adapters_diff::parse_multi_file_diff;
///
/// let diff = r#"diff --git a/pkg/x.go b/pkg/x.go
/// new file mode 100644
/// index 0000000..1111111
/// --- /dev/null
/// +++ b/pkg/x.go
/// @@ -0,0 +1,3 @@
/// +package pkg
/// +
/// +func X() {}
/// "#;
///
/// let files = parse_multi_file_diff(diff).unwrap();
/// assert_eq!(files.len(), 1);
/// assert_eq!(files[0].new_name, "b/pkg/x.go");
/// assert_eq!(files[0].hunks[0].lines.len(), 3);
/// ```
pub fn parse_multi_file_diff(text: &str) -> Result<Vec<FileDiff>, DiffError> {
    // Normalize line endings (handle CRLF)
    let text = text.replace("\r\n", "\n");

    let mut files: Vec<FileDiff> = Vec::new();
    let mut current: Option<FileDiff> = None;
    // Set once a `---` header was read for the current file.
    let mut seen_orig_header = false;
    // Lines still expected in the open hunk: (original side, new side).
    let mut remaining: Option<(u32, u32)> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if let Some((orig_left, new_left)) = remaining {
            let Some(file) = current.as_mut() else {
                return Err(DiffError::invalid(line_no, "hunk without a file header"));
            };
            let Some(hunk) = file.hunks.last_mut() else {
                return Err(DiffError::invalid(line_no, "hunk body without a header"));
            };

            let (body_line, orig_left, new_left) = match line.as_bytes().first() {
                Some(b'+') => (
                    Some(HunkLine::added(&line[1..])),
                    orig_left,
                    new_left.saturating_sub(1),
                ),
                Some(b'-') => (
                    Some(HunkLine::removed(&line[1..])),
                    orig_left.saturating_sub(1),
                    new_left,
                ),
                Some(b' ') => (
                    Some(HunkLine::context(&line[1..])),
                    orig_left.saturating_sub(1),
                    new_left.saturating_sub(1),
                ),
                None => (
                    Some(HunkLine::context("")),
                    orig_left.saturating_sub(1),
                    new_left.saturating_sub(1),
                ),
                // "\ No newline at end of file"
                Some(b'\\') => (None, orig_left, new_left),
                Some(_) => {
                    return Err(DiffError::invalid(
                        line_no,
                        format!("unexpected line in hunk: '{line}'"),
                    ));
                }
            };

            if let Some(body_line) = body_line {
                hunk.lines.push(body_line);
            }
            remaining = (orig_left > 0 || new_left > 0).then_some((orig_left, new_left));
            continue;
        }

        if let Some(rest) = line.strip_prefix("diff --git ") {
            files.extend(current.take());
            seen_orig_header = false;

            let mut parts = rest.split_whitespace();
            let orig_name = parts.next().unwrap_or_default().to_string();
            let new_name = parts.next().unwrap_or_default().to_string();
            current = Some(FileDiff {
                orig_name,
                new_name,
                ..Default::default()
            });
            continue;
        }

        if let Some(name) = line.strip_prefix("--- ") {
            // A `---` without a preceding `diff --git` starts a plain unified diff.
            let starts_new = match &current {
                None => true,
                Some(file) => seen_orig_header || !file.hunks.is_empty(),
            };
            if starts_new {
                files.extend(current.take());
                current = Some(FileDiff::default());
            }
            if let Some(file) = current.as_mut() {
                file.orig_name = header_name(name).to_string();
            }
            seen_orig_header = true;
            continue;
        }

        if let Some(name) = line.strip_prefix("+++ ") {
            let Some(file) = current.as_mut() else {
                return Err(DiffError::invalid(line_no, "'+++' header without '---'"));
            };
            file.new_name = header_name(name).to_string();
            continue;
        }

        if line.starts_with("@@") {
            let Some(file) = current.as_mut() else {
                return Err(DiffError::invalid(line_no, "hunk before any file header"));
            };
            let hunk = parse_hunk_header(line).ok_or_else(|| {
                DiffError::invalid(line_no, format!("malformed hunk header: '{line}'"))
            })?;
            if hunk.orig_lines > 0 || hunk.new_lines > 0 {
                remaining = Some((hunk.orig_lines, hunk.new_lines));
            }
            file.hunks.push(hunk);
            continue;
        }

        if line.starts_with("deleted file mode") {
            // Empty and binary deletions carry no `+++ /dev/null` header.
            if let Some(file) = current.as_mut() {
                file.new_name = DEV_NULL.to_string();
            }
            continue;
        }

        if line.starts_with("Binary files ") || line.starts_with("GIT binary patch") {
            if let Some(file) = current.as_mut() {
                file.is_binary = true;
            }
            continue;
        }

        // Extended headers (index, mode, rename, similarity), trailing
        // "\ No newline" markers, and preamble text carry nothing we need.
    }

    if let Some((orig_left, new_left)) = remaining {
        return Err(DiffError::invalid(
            text.lines().count(),
            format!("truncated hunk: {orig_left} original and {new_left} new lines missing"),
        ));
    }

    files.extend(current);
    Ok(files)
}

/// Strip a trailing timestamp (separated by a tab) from a `---`/`+++` name.
fn header_name(raw: &str) -> &str {
    raw.split('\t').next().unwrap_or(raw).trim_end()
}

/// Parse a hunk header into an empty [`Hunk`].
///
/// Hunk headers have the format `@@ -orig_start[,orig_count] +new_start[,new_count] @@ section`.
/// Omitted counts default to 1. Ranges whose end does not fit in a `u32`
/// are rejected.
fn parse_hunk_header(line: &str) -> Option<Hunk> {
    let rest = line.strip_prefix("@@ -")?;
    let (ranges, section) = rest.split_once(" @@")?;
    let (orig, new) = ranges.split_once(" +")?;
    let (orig_start_line, orig_lines) = parse_range(orig)?;
    let (new_start_line, new_lines) = parse_range(new)?;
    orig_start_line.checked_add(orig_lines)?;
    new_start_line.checked_add(new_lines)?;

    Some(Hunk {
        orig_start_line,
        orig_lines,
        new_start_line,
        new_lines,
        section: section.trim_start().to_string(),
        lines: Vec::new(),
    })
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use covdiff_ports::LineKind;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn parse_never_panics(text in ".*") {
            let _ = parse_multi_file_diff(&text);
        }

        #[test]
        fn added_lines_match_hunk_body(added in prop::collection::vec("[a-z ]{0,12}", 1..20)) {
            let mut diff = format!(
                "diff --git a/x.go b/x.go\n--- /dev/null\n+++ b/x.go\n@@ -0,0 +1,{} @@\n",
                added.len()
            );
            for line in &added {
                diff.push('+');
                diff.push_str(line);
                diff.push('\n');
            }

            let files = parse_multi_file_diff(&diff).unwrap();
            let hunk = &files[0].hunks[0];
            prop_assert_eq!(hunk.lines.len(), added.len());
            prop_assert!(hunk.lines.iter().all(|l| l.kind == LineKind::Added));
        }
    }
}
