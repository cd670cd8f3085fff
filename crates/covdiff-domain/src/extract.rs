//! Extraction of per-file interval sets from parsed diff and coverage records.

use std::collections::BTreeMap;

use covdiff_ports::{CoverageProfile, FileDiff, Hunk, LineKind, PathFilter};
use covdiff_types::{CoverageBlock, FilesIntervals, Interval};

// ============================================================================
// Diff Intervals
// ============================================================================

/// Repository-relative name of a diff's new file.
///
/// The first path segment (the `b/` side marker) is dropped. Returns `None`
/// for deleted files and names without a directory component.
///
/// # Examples
///
/// ```
/// use covdiff_domain::extract::repo_relative_name;
///
/// assert_eq!(repo_relative_name("b/pkg/x.go"), Some("pkg/x.go"));
/// assert_eq!(repo_relative_name("/dev/null"), None);
/// assert_eq!(repo_relative_name("x.go"), None);
/// ```
pub fn repo_relative_name(new_name: &str) -> Option<&str> {
    if new_name == "/dev/null" {
        return None;
    }
    match new_name.split_once('/') {
        Some((_, rest)) if !rest.is_empty() => Some(rest),
        _ => None,
    }
}

/// Intervals of added lines within one hunk, in new-file line numbers.
///
/// Removed lines do not occupy a new-file line. A run of added lines ends at
/// the next context line or at the end of the hunk.
pub fn hunk_intervals(hunk: &Hunk) -> Vec<Interval> {
    let mut intervals = Vec::new();
    let mut line = hunk.new_start_line;
    // (first, last) added line of the open run.
    let mut run: Option<(u32, u32)> = None;

    for hunk_line in &hunk.lines {
        match hunk_line.kind {
            LineKind::Removed => {}
            LineKind::Added => {
                run = Some(match run {
                    Some((start, _)) => (start, line),
                    None => (line, line),
                });
                line = line.saturating_add(1);
            }
            LineKind::Context => {
                if let Some((start, end)) = run.take() {
                    intervals.push(Interval::new(start, end));
                }
                line = line.saturating_add(1);
            }
        }
    }

    if let Some((start, end)) = run {
        intervals.push(Interval::new(start, end));
    }

    intervals
}

/// Map every non-skipped file of a diff to the intervals it added.
///
/// Files are keyed by [`repo_relative_name`]. A file with no added lines
/// still gets an (empty) entry. Intervals are appended hunk by hunk and are
/// not normalized.
pub fn diff_intervals<F>(files: &[FileDiff], filter: &F) -> FilesIntervals
where
    F: PathFilter + ?Sized,
{
    let mut result = FilesIntervals::new();

    for file in files {
        let Some(name) = repo_relative_name(&file.new_name) else {
            continue;
        };
        if filter.should_skip(name) {
            continue;
        }

        let entry = result.entry(name.to_string()).or_default();
        for hunk in &file.hunks {
            entry.extend(hunk_intervals(hunk));
        }
    }

    result
}

// ============================================================================
// Coverage Intervals
// ============================================================================

/// Covered and measured intervals per coverage file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageIntervals {
    /// Blocks executed at least once.
    pub covered: FilesIntervals,
    /// Every measured block, executed or not.
    pub all_statements: FilesIntervals,
}

impl CoverageIntervals {
    /// Split grouped coverage blocks into covered and all-statement sets.
    pub fn from_blocks(blocks: &BTreeMap<String, Vec<CoverageBlock>>) -> Self {
        let mut intervals = Self::default();

        for (file, file_blocks) in blocks {
            let all = intervals.all_statements.entry(file.clone()).or_default();
            for block in file_blocks {
                all.push(block.block);
                if block.execution_count > 0 {
                    intervals
                        .covered
                        .entry(file.clone())
                        .or_default()
                        .push(block.block);
                }
            }
        }

        intervals
    }
}

/// Group the blocks of every non-skipped profile by file name.
///
/// Every non-skipped profile gets an entry, even when it has no blocks.
pub fn coverage_blocks<F>(
    profiles: &[CoverageProfile],
    filter: &F,
) -> BTreeMap<String, Vec<CoverageBlock>>
where
    F: PathFilter + ?Sized,
{
    let mut result: BTreeMap<String, Vec<CoverageBlock>> = BTreeMap::new();

    for profile in profiles {
        if filter.should_skip(&profile.file_name) {
            continue;
        }

        let entry = result.entry(profile.file_name.clone()).or_default();
        for block in &profile.blocks {
            // Hand-built records may be inverted; the parser never yields them.
            let end = block.end_line.max(block.start_line);
            entry.push(CoverageBlock {
                file_name: profile.file_name.clone(),
                block: Interval::new(block.start_line, end),
                statement_count: block.num_stmt,
                execution_count: block.count,
            });
        }
    }

    result
}

/// Covered and all-statement intervals of every non-skipped profile.
pub fn coverage_intervals<F>(profiles: &[CoverageProfile], filter: &F) -> CoverageIntervals
where
    F: PathFilter + ?Sized,
{
    CoverageIntervals::from_blocks(&coverage_blocks(profiles, filter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use covdiff_ports::{HunkLine, ProfileBlock};

    fn iv(start: u32, end: u32) -> Interval {
        Interval::new(start, end)
    }

    fn no_skip(_: &str) -> bool {
        false
    }

    fn hunk(new_start_line: u32, lines: Vec<HunkLine>) -> Hunk {
        Hunk {
            new_start_line,
            lines,
            ..Default::default()
        }
    }

    fn file(new_name: &str, hunks: Vec<Hunk>) -> FileDiff {
        FileDiff {
            orig_name: new_name.replacen("b/", "a/", 1),
            new_name: new_name.to_string(),
            hunks,
            ..Default::default()
        }
    }

    fn block(start_line: u32, end_line: u32, count: u64) -> ProfileBlock {
        ProfileBlock {
            start_line,
            start_col: 1,
            end_line,
            end_col: 2,
            num_stmt: 1,
            count,
        }
    }

    // ------------------------------------------------------------------------
    // Names
    // ------------------------------------------------------------------------

    #[test]
    fn test_repo_relative_name_drops_first_segment_only() {
        assert_eq!(repo_relative_name("b/a/b/c.go"), Some("a/b/c.go"));
        assert_eq!(repo_relative_name("w/main.go"), Some("main.go"));
    }

    #[test]
    fn test_repo_relative_name_rejects_trailing_slash() {
        assert_eq!(repo_relative_name("b/"), None);
    }

    // ------------------------------------------------------------------------
    // Hunks
    // ------------------------------------------------------------------------

    #[test]
    fn test_hunk_all_added() {
        let h = hunk(1, vec![HunkLine::added("a"), HunkLine::added("b")]);
        assert_eq!(hunk_intervals(&h), vec![iv(1, 2)]);
    }

    #[test]
    fn test_hunk_run_closed_by_context() {
        let h = hunk(
            10,
            vec![
                HunkLine::context("x"),
                HunkLine::added("a"),
                HunkLine::added("b"),
                HunkLine::context("y"),
            ],
        );
        // Context at 10, added at 11-12, context at 13.
        assert_eq!(hunk_intervals(&h), vec![iv(11, 12)]);
    }

    #[test]
    fn test_hunk_removed_lines_do_not_advance() {
        let h = hunk(
            5,
            vec![
                HunkLine::context("x"),
                HunkLine::removed("old"),
                HunkLine::removed("older"),
                HunkLine::added("new"),
                HunkLine::context("y"),
                HunkLine::removed("gone"),
                HunkLine::context("z"),
            ],
        );
        assert_eq!(hunk_intervals(&h), vec![iv(6, 6)]);
    }

    #[test]
    fn test_hunk_removed_line_inside_added_run_keeps_run_open() {
        let h = hunk(
            1,
            vec![
                HunkLine::added("a"),
                HunkLine::removed("old"),
                HunkLine::added("b"),
            ],
        );
        assert_eq!(hunk_intervals(&h), vec![iv(1, 2)]);
    }

    #[test]
    fn test_hunk_multiple_runs() {
        let h = hunk(
            20,
            vec![
                HunkLine::added("a"),
                HunkLine::context("x"),
                HunkLine::context("y"),
                HunkLine::added("b"),
                HunkLine::added("c"),
                HunkLine::added("d"),
            ],
        );
        assert_eq!(hunk_intervals(&h), vec![iv(20, 20), iv(23, 25)]);
    }

    #[test]
    fn test_hunk_at_last_line_number_stays_ordered() {
        let h = hunk(
            u32::MAX,
            vec![HunkLine::added("a"), HunkLine::added("b"), HunkLine::context("c")],
        );
        let ivs = hunk_intervals(&h);
        assert_eq!(ivs, vec![Interval::line(u32::MAX)]);
        assert!(ivs.iter().all(|iv| iv.start <= iv.end));
    }

    #[test]
    fn test_hunk_deletion_only_has_no_intervals() {
        let h = hunk(
            3,
            vec![HunkLine::context("x"), HunkLine::removed("old")],
        );
        assert!(hunk_intervals(&h).is_empty());
    }

    // ------------------------------------------------------------------------
    // Diff files
    // ------------------------------------------------------------------------

    #[test]
    fn test_diff_intervals_appends_across_hunks() {
        let files = vec![file(
            "b/pkg/x.go",
            vec![
                hunk(30, vec![HunkLine::added("late")]),
                hunk(2, vec![HunkLine::added("early"), HunkLine::context("c")]),
            ],
        )];

        let intervals = diff_intervals(&files, &no_skip);
        assert_eq!(intervals.get("pkg/x.go"), Some(&vec![iv(30, 30), iv(2, 2)]));
    }

    #[test]
    fn test_diff_intervals_skips_filtered_and_deleted() {
        let files = vec![
            file("b/pkg/x_test.go", vec![hunk(1, vec![HunkLine::added("t")])]),
            file("/dev/null", vec![hunk(0, vec![HunkLine::removed("gone")])]),
            file("b/pkg/x.go", vec![hunk(1, vec![HunkLine::added("a")])]),
        ];
        let skip_tests = |path: &str| path.ends_with("_test.go");

        let intervals = diff_intervals(&files, &skip_tests);
        assert_eq!(intervals.len(), 1);
        assert!(intervals.contains_key("pkg/x.go"));
    }

    #[test]
    fn test_diff_intervals_keeps_entry_without_additions() {
        let files = vec![file(
            "b/pkg/x.go",
            vec![hunk(1, vec![HunkLine::removed("old")])],
        )];

        let intervals = diff_intervals(&files, &no_skip);
        assert_eq!(intervals.get("pkg/x.go"), Some(&vec![]));
    }

    // ------------------------------------------------------------------------
    // Coverage
    // ------------------------------------------------------------------------

    #[test]
    fn test_coverage_intervals_split_by_execution_count() {
        let profiles = vec![CoverageProfile {
            file_name: "example.com/m/pkg/x.go".to_string(),
            mode: "set".to_string(),
            blocks: vec![block(3, 5, 1), block(6, 8, 0), block(9, 9, 7)],
        }];

        let cov = coverage_intervals(&profiles, &no_skip);
        assert_eq!(
            cov.all_statements.get("example.com/m/pkg/x.go"),
            Some(&vec![iv(3, 5), iv(6, 8), iv(9, 9)])
        );
        assert_eq!(
            cov.covered.get("example.com/m/pkg/x.go"),
            Some(&vec![iv(3, 5), iv(9, 9)])
        );
    }

    #[test]
    fn test_coverage_intervals_never_executed_file_has_no_covered_entry() {
        let profiles = vec![CoverageProfile {
            file_name: "m/x.go".to_string(),
            mode: "set".to_string(),
            blocks: vec![block(1, 2, 0)],
        }];

        let cov = coverage_intervals(&profiles, &no_skip);
        assert!(cov.all_statements.contains_key("m/x.go"));
        assert!(!cov.covered.contains_key("m/x.go"));
    }

    #[test]
    fn test_coverage_blocks_respect_filter() {
        let profiles = vec![
            CoverageProfile {
                file_name: "m/vendor/dep/d.go".to_string(),
                mode: "set".to_string(),
                blocks: vec![block(1, 2, 1)],
            },
            CoverageProfile {
                file_name: "m/x.go".to_string(),
                mode: "set".to_string(),
                blocks: vec![],
            },
        ];
        let skip_vendor = |path: &str| path.contains("vendor/");

        let blocks = coverage_blocks(&profiles, &skip_vendor);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks.get("m/x.go"), Some(&vec![]));
    }

    #[test]
    fn test_coverage_blocks_carry_counts() {
        let profiles = vec![CoverageProfile {
            file_name: "m/x.go".to_string(),
            mode: "count".to_string(),
            blocks: vec![ProfileBlock {
                start_line: 4,
                start_col: 10,
                end_line: 6,
                end_col: 2,
                num_stmt: 3,
                count: 12,
            }],
        }];

        let blocks = coverage_blocks(&profiles, &no_skip);
        assert_eq!(
            blocks["m/x.go"],
            vec![CoverageBlock {
                file_name: "m/x.go".to_string(),
                block: iv(4, 6),
                statement_count: 3,
                execution_count: 12,
            }]
        );
    }
}
