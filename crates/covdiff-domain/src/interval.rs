//! Set algebra over closed line intervals.
//!
//! Every operation accepts unordered, possibly overlapping input and returns
//! a normalized set: sorted by start, with no two intervals overlapping or
//! sharing an endpoint. Note that intervals separated by a strict gap
//! (`1-5` and `6-10`) stay apart; only `end >= next.start` merges.

use covdiff_types::Interval;

/// Sort and merge overlapping or endpoint-sharing intervals.
///
/// # Examples
///
/// ```
/// use covdiff_domain::interval::normalize;
/// use covdiff_types::Interval;
///
/// let merged = normalize(&[Interval::new(5, 10), Interval::new(1, 5)]);
/// assert_eq!(merged, vec![Interval::new(1, 10)]);
///
/// let apart = normalize(&[Interval::new(1, 5), Interval::new(6, 10)]);
/// assert_eq!(apart.len(), 2);
/// ```
pub fn normalize(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted = intervals.to_vec();
    sorted.sort_unstable();
    join_sorted(sorted)
}

/// Merge pass over intervals already sorted by start.
fn join_sorted(sorted: Vec<Interval>) -> Vec<Interval> {
    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());

    for next in sorted {
        match merged.last_mut() {
            Some(last) if last.end >= next.start => {
                last.end = last.end.max(next.end);
            }
            _ => merged.push(next),
        }
    }

    merged
}

/// Total number of lines in the set.
///
/// The set must be normalized; overlapping input is counted twice.
pub fn sum(intervals: &[Interval]) -> u64 {
    intervals.iter().map(Interval::len).sum()
}

/// Lines present in both `a` and `b`.
///
/// Older tooling called this operation "union" because it unions the
/// regions two reports agree on. It is an intersection.
///
/// # Examples
///
/// ```
/// use covdiff_domain::interval::overlap;
/// use covdiff_types::Interval;
///
/// let changed = [Interval::new(10, 20)];
/// let covered = [Interval::new(8, 14), Interval::new(18, 30)];
/// assert_eq!(
///     overlap(&changed, &covered),
///     vec![Interval::new(10, 14), Interval::new(18, 20)]
/// );
/// ```
pub fn overlap(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let a = normalize(a);
    let b = normalize(b);

    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].end < b[j].start {
            i += 1;
            continue;
        }
        if a[i].start > b[j].end {
            j += 1;
            continue;
        }

        result.push(Interval::new(
            a[i].start.max(b[j].start),
            a[i].end.min(b[j].end),
        ));

        // Keep whichever interval extends further; it may meet the next one.
        if a[i].end > b[j].end {
            j += 1;
        } else {
            i += 1;
        }
    }

    join_sorted(result)
}

/// Lines of `a` not present in `b`.
///
/// # Examples
///
/// ```
/// use covdiff_domain::interval::difference;
/// use covdiff_types::Interval;
///
/// let measured = [Interval::new(1, 10)];
/// let covered = [Interval::new(3, 4), Interval::new(8, 8)];
/// assert_eq!(
///     difference(&measured, &covered),
///     vec![Interval::new(1, 2), Interval::new(5, 7), Interval::new(9, 10)]
/// );
/// ```
pub fn difference(a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    if a.is_empty() {
        return Vec::new();
    }
    if b.is_empty() {
        return normalize(a);
    }

    let mut a = normalize(a);
    let b = normalize(b);

    let mut result = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() {
        if j >= b.len() || a[i].end < b[j].start {
            result.push(a[i]);
            i += 1;
            continue;
        }
        if a[i].start > b[j].end {
            j += 1;
            continue;
        }

        if a[i].start < b[j].start {
            result.push(Interval::new(a[i].start, b[j].start - 1));
        }

        if a[i].end > b[j].end {
            // b[j].end < a[i].end, so the increment cannot overflow.
            a[i].start = b[j].end + 1;
            j += 1;
        } else {
            i += 1;
        }
    }

    join_sorted(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: u32, end: u32) -> Interval {
        Interval::new(start, end)
    }

    // ------------------------------------------------------------------------
    // normalize
    // ------------------------------------------------------------------------

    #[test]
    fn test_normalize_empty() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_normalize_single() {
        assert_eq!(normalize(&[iv(3, 7)]), vec![iv(3, 7)]);
    }

    #[test]
    fn test_normalize_sorts() {
        assert_eq!(
            normalize(&[iv(20, 25), iv(1, 2), iv(10, 12)]),
            vec![iv(1, 2), iv(10, 12), iv(20, 25)]
        );
    }

    #[test]
    fn test_normalize_merges_shared_endpoint() {
        assert_eq!(normalize(&[iv(1, 5), iv(5, 10)]), vec![iv(1, 10)]);
    }

    #[test]
    fn test_normalize_keeps_strict_gap_apart() {
        assert_eq!(normalize(&[iv(1, 5), iv(6, 10)]), vec![iv(1, 5), iv(6, 10)]);
    }

    #[test]
    fn test_normalize_merges_contained() {
        assert_eq!(normalize(&[iv(1, 20), iv(4, 6), iv(18, 19)]), vec![iv(1, 20)]);
    }

    #[test]
    fn test_normalize_merges_chain() {
        assert_eq!(
            normalize(&[iv(9, 12), iv(1, 4), iv(4, 9), iv(30, 31)]),
            vec![iv(1, 12), iv(30, 31)]
        );
    }

    #[test]
    fn test_normalize_same_start_keeps_longest() {
        assert_eq!(normalize(&[iv(1, 9), iv(1, 3)]), vec![iv(1, 9)]);
    }

    #[test]
    fn test_normalize_duplicate_points() {
        assert_eq!(normalize(&[iv(4, 4), iv(4, 4)]), vec![iv(4, 4)]);
    }

    // ------------------------------------------------------------------------
    // sum
    // ------------------------------------------------------------------------

    #[test]
    fn test_sum_empty_is_zero() {
        assert_eq!(sum(&[]), 0);
    }

    #[test]
    fn test_sum_counts_inclusive_lines() {
        assert_eq!(sum(&[iv(1, 1), iv(10, 20)]), 12);
    }

    #[test]
    fn test_sum_double_counts_unnormalized_input() {
        let raw = [iv(1, 5), iv(3, 7)];
        assert_eq!(sum(&raw), 10);
        assert_eq!(sum(&normalize(&raw)), 7);
    }

    // ------------------------------------------------------------------------
    // overlap
    // ------------------------------------------------------------------------

    #[test]
    fn test_overlap_with_empty_is_empty() {
        assert!(overlap(&[], &[iv(1, 5)]).is_empty());
        assert!(overlap(&[iv(1, 5)], &[]).is_empty());
    }

    #[test]
    fn test_overlap_disjoint_is_empty() {
        assert!(overlap(&[iv(1, 5)], &[iv(6, 10)]).is_empty());
    }

    #[test]
    fn test_overlap_shared_endpoint_is_single_line() {
        assert_eq!(overlap(&[iv(1, 5)], &[iv(5, 10)]), vec![iv(5, 5)]);
    }

    #[test]
    fn test_overlap_contained() {
        assert_eq!(overlap(&[iv(8, 20)], &[iv(10, 15)]), vec![iv(10, 15)]);
    }

    #[test]
    fn test_overlap_one_interval_spans_several() {
        assert_eq!(
            overlap(&[iv(1, 100)], &[iv(5, 6), iv(10, 12), iv(99, 120)]),
            vec![iv(5, 6), iv(10, 12), iv(99, 100)]
        );
    }

    #[test]
    fn test_overlap_equal_ends_advance_correctly() {
        assert_eq!(
            overlap(&[iv(1, 5), iv(7, 9)], &[iv(3, 5), iv(8, 12)]),
            vec![iv(3, 5), iv(8, 9)]
        );
    }

    #[test]
    fn test_overlap_normalizes_unsorted_inputs() {
        assert_eq!(
            overlap(&[iv(10, 20), iv(1, 3)], &[iv(15, 30), iv(2, 2), iv(2, 12)]),
            vec![iv(2, 3), iv(10, 12), iv(15, 20)]
        );
    }

    #[test]
    fn test_overlap_is_not_a_union() {
        // Historically named "union"; it keeps only the shared lines.
        let result = overlap(&[iv(1, 10)], &[iv(5, 20)]);
        assert_eq!(result, vec![iv(5, 10)]);
        assert_ne!(result, vec![iv(1, 20)]);
    }

    #[test]
    fn test_overlap_merges_touching_inputs() {
        assert_eq!(
            overlap(&[iv(3, 8)], &[iv(1, 5), iv(5, 9)]),
            vec![iv(3, 8)]
        );
    }

    // ------------------------------------------------------------------------
    // difference
    // ------------------------------------------------------------------------

    #[test]
    fn test_difference_empty_a() {
        assert!(difference(&[], &[iv(1, 5)]).is_empty());
    }

    #[test]
    fn test_difference_empty_b_normalizes_a() {
        assert_eq!(difference(&[iv(5, 9), iv(1, 5)], &[]), vec![iv(1, 9)]);
    }

    #[test]
    fn test_difference_removes_middle() {
        assert_eq!(
            difference(&[iv(1, 10)], &[iv(4, 6)]),
            vec![iv(1, 3), iv(7, 10)]
        );
    }

    #[test]
    fn test_difference_removes_prefix_and_suffix() {
        assert_eq!(difference(&[iv(5, 10)], &[iv(1, 6)]), vec![iv(7, 10)]);
        assert_eq!(difference(&[iv(5, 10)], &[iv(9, 20)]), vec![iv(5, 8)]);
    }

    #[test]
    fn test_difference_fully_covered_is_empty() {
        assert!(difference(&[iv(5, 10)], &[iv(1, 20)]).is_empty());
        assert!(difference(&[iv(5, 10)], &[iv(5, 10)]).is_empty());
    }

    #[test]
    fn test_difference_single_line_edges() {
        assert_eq!(difference(&[iv(1, 3)], &[iv(1, 1)]), vec![iv(2, 3)]);
        assert_eq!(difference(&[iv(1, 3)], &[iv(3, 3)]), vec![iv(1, 2)]);
        assert_eq!(difference(&[iv(1, 3)], &[iv(2, 2)]), vec![iv(1, 1), iv(3, 3)]);
    }

    #[test]
    fn test_difference_b_interval_spans_several_a() {
        assert_eq!(
            difference(&[iv(1, 3), iv(5, 7), iv(9, 12)], &[iv(2, 10)]),
            vec![iv(1, 1), iv(11, 12)]
        );
    }

    #[test]
    fn test_difference_several_b_in_one_a() {
        assert_eq!(
            difference(&[iv(1, 20)], &[iv(2, 3), iv(6, 6), iv(19, 25)]),
            vec![iv(1, 1), iv(4, 5), iv(7, 18)]
        );
    }

    #[test]
    fn test_difference_b_before_and_after_a() {
        assert_eq!(
            difference(&[iv(10, 12)], &[iv(1, 2), iv(30, 40)]),
            vec![iv(10, 12)]
        );
    }

    #[test]
    fn test_difference_at_line_zero() {
        assert_eq!(difference(&[iv(0, 4)], &[iv(0, 0)]), vec![iv(1, 4)]);
    }

    #[test]
    fn test_difference_at_u32_max() {
        assert_eq!(
            difference(&[iv(u32::MAX - 2, u32::MAX)], &[iv(u32::MAX, u32::MAX)]),
            vec![iv(u32::MAX - 2, u32::MAX - 1)]
        );
    }
}

// ============================================================================
// Property Tests
// ============================================================================
