//! Go coverage profile parser for covdiff.
//!
//! This crate parses the text format written by `go test -coverprofile`,
//! producing one [`CoverageProfile`] per source file with its blocks sorted
//! by position and duplicate blocks merged.

use std::collections::BTreeMap;

use covdiff_ports::{CoverageProfile, ProfileBlock};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while parsing coverage profiles.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoverError {
    /// The first non-blank line is not a `mode: <mode>` header.
    #[error("bad mode line: {0:?}")]
    BadModeLine(String),

    /// A later `mode:` header disagrees with the first one.
    #[error("line {line}: mode {found:?} conflicts with {expected:?}")]
    ModeMismatch {
        line: usize,
        expected: String,
        found: String,
    },

    /// A block line does not match `file:sl.sc,el.ec numStmt count`.
    #[error("line {line}: {text:?} doesn't match expected format")]
    InvalidLine { line: usize, text: String },

    /// A block ends before it starts.
    #[error("line {line}: block ends before it starts")]
    InvertedBlock { line: usize },

    /// The same block was reported with different statement counts.
    #[error("{file}: inconsistent NumStmt: changed from {from} to {to}")]
    InconsistentStatements { file: String, from: u32, to: u32 },
}

// ============================================================================
// Profile Parsing
// ============================================================================

const MODE_PREFIX: &str = "mode: ";

/// Parse a Go coverage profile.
///
/// Empty or blank input yields no profiles. Otherwise the first non-blank
/// line must be `mode: set|count|atomic`; every other
/// line describes one block as `file:startLine.startCol,endLine.endCol numStmt count`.
/// Repeated mode headers with the same mode (as left by concatenating
/// profiles) are skipped.
///
/// Profiles are returned sorted by file name. Blocks within a profile are
/// sorted by start position, and blocks reported more than once are merged:
/// in `set` mode the counts are OR-ed, otherwise they are summed.
///
/// # Examples
///
/// ```
/// use covdiff_adapters_coverage::parse_profiles;
///
/// let text = "mode: set\n\
///             example.com/m/x.go:3.14,5.2 2 1\n\
///             example.com/m/x.go:7.10,9.2 1 0\n";
///
/// let profiles = parse_profiles(text).unwrap();
/// assert_eq!(profiles.len(), 1);
/// assert_eq!(profiles[0].file_name, "example.com/m/x.go");
/// assert_eq!(profiles[0].mode, "set");
/// assert_eq!(profiles[0].blocks[1].count, 0);
/// ```
pub fn parse_profiles(text: &str) -> Result<Vec<CoverageProfile>, CoverError> {
    let mut mode: Option<String> = None;
    let mut files: BTreeMap<String, Vec<ProfileBlock>> = BTreeMap::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let Some(expected) = mode.as_deref() else {
            let parsed = line
                .strip_prefix(MODE_PREFIX)
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .ok_or_else(|| CoverError::BadModeLine(line.to_string()))?;
            mode = Some(parsed.to_string());
            continue;
        };

        if let Some(found) = line.strip_prefix(MODE_PREFIX) {
            let found = found.trim();
            if found != expected {
                return Err(CoverError::ModeMismatch {
                    line: line_no,
                    expected: expected.to_string(),
                    found: found.to_string(),
                });
            }
            continue;
        }

        let (file_name, block) = parse_block_line(line).ok_or_else(|| CoverError::InvalidLine {
            line: line_no,
            text: line.to_string(),
        })?;
        if (block.end_line, block.end_col) < (block.start_line, block.start_col) {
            return Err(CoverError::InvertedBlock { line: line_no });
        }
        files.entry(file_name.to_string()).or_default().push(block);
    }

    // Empty or blank input has no blocks to report.
    let Some(mode) = mode else {
        return Ok(Vec::new());
    };

    files
        .into_iter()
        .map(|(file_name, blocks)| {
            let blocks = merge_blocks(&file_name, &mode, blocks)?;
            Ok(CoverageProfile {
                file_name,
                mode: mode.clone(),
                blocks,
            })
        })
        .collect()
}

/// Parse `file:sl.sc,el.ec numStmt count`, splitting from the right so that
/// file names containing `:` survive.
fn parse_block_line(line: &str) -> Option<(&str, ProfileBlock)> {
    let (rest, count) = line.rsplit_once(' ')?;
    let (rest, num_stmt) = rest.rsplit_once(' ')?;
    let (file_name, span) = rest.rsplit_once(':')?;
    if file_name.is_empty() {
        return None;
    }

    let (start, end) = span.split_once(',')?;
    let (start_line, start_col) = parse_position(start)?;
    let (end_line, end_col) = parse_position(end)?;

    Some((
        file_name,
        ProfileBlock {
            start_line,
            start_col,
            end_line,
            end_col,
            num_stmt: parse_digits(num_stmt)?,
            count: parse_digits(count)?,
        },
    ))
}

fn parse_position(pos: &str) -> Option<(u32, u32)> {
    let (line, col) = pos.split_once('.')?;
    Some((parse_digits(line)?, parse_digits(col)?))
}

/// Like `str::parse`, but rejects signs.
fn parse_digits<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn merge_blocks(
    file_name: &str,
    mode: &str,
    mut blocks: Vec<ProfileBlock>,
) -> Result<Vec<ProfileBlock>, CoverError> {
    blocks.sort_by_key(|b| (b.start_line, b.start_col, b.end_line, b.end_col));

    let mut merged: Vec<ProfileBlock> = Vec::with_capacity(blocks.len());
    for block in blocks {
        if let Some(last) = merged.last_mut()
            && same_span(last, &block)
        {
            if last.num_stmt != block.num_stmt {
                return Err(CoverError::InconsistentStatements {
                    file: file_name.to_string(),
                    from: last.num_stmt,
                    to: block.num_stmt,
                });
            }
            if mode == "set" {
                last.count |= block.count;
            } else {
                last.count = last.count.saturating_add(block.count);
            }
            continue;
        }
        merged.push(block);
    }

    Ok(merged)
}

fn same_span(a: &ProfileBlock, b: &ProfileBlock) -> bool {
    (a.start_line, a.start_col, a.end_line, a.end_col)
        == (b.start_line, b.start_col, b.end_line, b.end_col)
}

// ============================================================================
// Tests
// ============================================================================


// ============================================================================
// Property Tests
// ============================================================================
