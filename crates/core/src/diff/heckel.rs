//! Two-way line diff using Heckel's unique-line anchoring.
//!
//! P. Heckel, "A technique for isolating differences between files",
//! Communications of the ACM 21(4), 1978.
//!
//! Lines that occur exactly once in each input are anchors. Equal runs are
//! grown outward from every anchor, and whatever lies between two consecutive
//! runs becomes a delete, insert, or change span. Regions with no unique line
//! collapse into a single change span.

use std::collections::HashMap;
use std::fmt;

/// Kind of an [`EditSpan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    /// Lines equal on both sides (only produced by [`LineDiff::script`]).
    Copy,
    /// Lines present only in A.
    Delete,
    /// Lines present only in B.
    Insert,
    /// Lines replaced.
    Change,
}

/// One contiguous edit between sequences A and B.
///
/// Ranges are 1-indexed and inclusive. An empty range has `lo == hi + 1` and
/// denotes the position *before* line `lo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditSpan {
    pub kind: EditKind,
    pub lo_a: usize,
    pub hi_a: usize,
    pub lo_b: usize,
    pub hi_b: usize,
}

impl EditSpan {
    /// Build a span over the half-open 0-based ranges `a0..a1` and `b0..b1`.
    fn between(a0: usize, a1: usize, b0: usize, b1: usize) -> Option<Self> {
        let kind = match (a0 < a1, b0 < b1) {
            (true, true) => EditKind::Change,
            (true, false) => EditKind::Delete,
            (false, true) => EditKind::Insert,
            (false, false) => return None,
        };
        Some(Self {
            kind,
            lo_a: a0 + 1,
            hi_a: a1,
            lo_b: b0 + 1,
            hi_b: b1,
        })
    }

    pub fn len_a(&self) -> usize {
        self.hi_a + 1 - self.lo_a
    }

    pub fn len_b(&self) -> usize {
        self.hi_b + 1 - self.lo_b
    }

    /// 0-based half-open index range into A.
    pub fn range_a(&self) -> std::ops::Range<usize> {
        self.lo_a - 1..self.hi_a
    }

    /// 0-based half-open index range into B.
    pub fn range_b(&self) -> std::ops::Range<usize> {
        self.lo_b - 1..self.hi_b
    }
}

/// Classic "normal diff" header, e.g. `3,4c3`, `5a6,7`, `2d1`.
impl fmt::Display for EditSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn range(lo: usize, hi: usize) -> String {
            match lo.cmp(&hi) {
                std::cmp::Ordering::Less => format!("{},{}", lo, hi),
                std::cmp::Ordering::Equal => lo.to_string(),
                std::cmp::Ordering::Greater => hi.to_string(),
            }
        }
        match self.kind {
            EditKind::Copy => write!(f, "{}={}", range(self.lo_a, self.hi_a), range(self.lo_b, self.hi_b)),
            EditKind::Delete => write!(f, "{}d{}", range(self.lo_a, self.hi_a), self.hi_b),
            EditKind::Insert => write!(f, "{}a{}", self.hi_a, range(self.lo_b, self.hi_b)),
            EditKind::Change => write!(f, "{}c{}", range(self.lo_a, self.hi_a), range(self.lo_b, self.hi_b)),
        }
    }
}

/// Stateless two-way diff engine.
pub struct LineDiff;

impl LineDiff {
    /// Diff `a` against `b`, returning only the non-equal spans in increasing
    /// order of position.
    pub fn diff<S: AsRef<str>>(a: &[S], b: &[S]) -> Vec<EditSpan> {
        let (n, m) = (a.len(), b.len());
        let eq = |i: usize, j: usize| a[i].as_ref() == b[j].as_ref();

        let mut spans = Vec::new();
        let mut anchors = unique_anchors(a, b);
        anchors.push((n, m));

        let (mut a1, mut b1) = (0, 0);
        while a1 < n && b1 < m && eq(a1, b1) {
            a1 += 1;
            b1 += 1;
        }

        for (a_anchor, b_anchor) in anchors {
            // Anchors that cross an already matched run are ignored.
            if a_anchor < a1 || b_anchor < b1 {
                continue;
            }
            let (a0, b0) = (a1, b1);

            // Grow the anchor's equal run backwards.
            let (mut a_end, mut b_end) = (a_anchor, b_anchor);
            while a_end > a0 && b_end > b0 && eq(a_end - 1, b_end - 1) {
                a_end -= 1;
                b_end -= 1;
            }
            spans.extend(EditSpan::between(a0, a_end, b0, b_end));

            // ...and forwards.
            a1 = a_anchor + 1;
            b1 = b_anchor + 1;
            while a1 < n && b1 < m && eq(a1, b1) {
                a1 += 1;
                b1 += 1;
            }
        }

        spans
    }

    /// Full edit script: like [`LineDiff::diff`] but with every equal run
    /// materialized as a [`EditKind::Copy`] span, so the A-ranges cover
    /// `1..=a.len()` and the B-ranges cover `1..=b.len()`.
    pub fn script<S: AsRef<str>>(a: &[S], b: &[S]) -> Vec<EditSpan> {
        fn copy_run(script: &mut Vec<EditSpan>, lo_a: usize, hi_a: usize, lo_b: usize, hi_b: usize) {
            if lo_a <= hi_a {
                script.push(EditSpan {
                    kind: EditKind::Copy,
                    lo_a,
                    hi_a,
                    lo_b,
                    hi_b,
                });
            }
        }

        let mut script = Vec::new();
        let (mut next_a, mut next_b) = (1, 1);
        for span in Self::diff(a, b) {
            copy_run(&mut script, next_a, span.lo_a - 1, next_b, span.lo_b - 1);
            script.push(span);
            next_a = span.hi_a + 1;
            next_b = span.hi_b + 1;
        }
        copy_run(&mut script, next_a, a.len(), next_b, b.len());
        script
    }
}

/// Positions `(i, j)` of lines occurring exactly once in `a` and once in `b`,
/// sorted by position in `a`.
fn unique_anchors<S: AsRef<str>>(a: &[S], b: &[S]) -> Vec<(usize, usize)> {
    // Weight 2 per occurrence in A, 3 per occurrence in B: a total of
    // exactly 5 means one occurrence on each side.
    let mut table: HashMap<&str, (u32, usize, usize)> = HashMap::new();
    for (i, line) in a.iter().enumerate() {
        let entry = table.entry(line.as_ref()).or_insert((0, 0, 0));
        entry.0 += 2;
        entry.1 = i;
    }
    for (j, line) in b.iter().enumerate() {
        let entry = table.entry(line.as_ref()).or_insert((0, 0, 0));
        entry.0 += 3;
        entry.2 = j;
    }

    let mut anchors: Vec<(usize, usize)> = table
        .into_values()
        .filter(|&(freq, _, _)| freq == 5)
        .map(|(_, i, j)| (i, j))
        .collect();
    // Every anchor has a distinct A position, so the order is total.
    anchors.sort_unstable();
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn span(kind: EditKind, lo_a: usize, hi_a: usize, lo_b: usize, hi_b: usize) -> EditSpan {
        EditSpan {
            kind,
            lo_a,
            hi_a,
            lo_b,
            hi_b,
        }
    }

    #[test]
    fn test_identical_sequences_have_no_spans() {
        let a = lines("a b c d a b");
        assert!(LineDiff::diff(&a, &a).is_empty());
    }

    #[test]
    fn test_empty_sequences() {
        let empty: Vec<String> = Vec::new();
        assert!(LineDiff::diff(&empty, &empty).is_empty());
        assert_eq!(
            LineDiff::diff(&empty, &lines("x y")),
            vec![span(EditKind::Insert, 1, 0, 1, 2)]
        );
        assert_eq!(
            LineDiff::diff(&lines("x y"), &empty),
            vec![span(EditKind::Delete, 1, 2, 1, 0)]
        );
    }

    #[test]
    fn test_single_change() {
        let spans = LineDiff::diff(&lines("a b c"), &lines("a B c"));
        assert_eq!(spans, vec![span(EditKind::Change, 2, 2, 2, 2)]);
    }

    #[test]
    fn test_insert_and_delete() {
        let spans = LineDiff::diff(&lines("a b c d"), &lines("a x b d"));
        assert_eq!(
            spans,
            vec![
                span(EditKind::Insert, 2, 1, 2, 2),
                span(EditKind::Delete, 3, 3, 4, 3),
            ]
        );
    }

    #[test]
    fn test_change_at_end() {
        let spans = LineDiff::diff(&lines("a b c"), &lines("a b C"));
        assert_eq!(spans, vec![span(EditKind::Change, 3, 3, 3, 3)]);
    }

    #[test]
    fn test_duplicates_without_anchor_collapse_to_change() {
        let spans = LineDiff::diff(&lines("x x"), &lines("y x x y"));
        // Leading "x" vs "y" differ and no line is unique on both sides.
        assert_eq!(spans, vec![span(EditKind::Change, 1, 2, 1, 4)]);
    }

    #[test]
    fn test_deterministic_output() {
        let a = lines("p q r s t u v w");
        let b = lines("p r q s x u w v");
        let first = LineDiff::diff(&a, &b);
        for _ in 0..10 {
            assert_eq!(LineDiff::diff(&a, &b), first);
        }
    }

    #[test]
    fn test_script_covers_both_sequences() {
        let a = lines("a b c d e");
        let b = lines("a x c e f");
        let script = LineDiff::script(&a, &b);

        let mut next_a = 1;
        let mut next_b = 1;
        for s in &script {
            assert_eq!(s.lo_a, next_a);
            assert_eq!(s.lo_b, next_b);
            next_a = s.hi_a + 1;
            next_b = s.hi_b + 1;
        }
        assert_eq!(next_a, a.len() + 1);
        assert_eq!(next_b, b.len() + 1);

        for s in script.iter().filter(|s| s.kind == EditKind::Copy) {
            assert_eq!(&a[s.range_a()], &b[s.range_b()]);
        }
    }

    #[test]
    fn test_display_normal_diff_headers() {
        assert_eq!(span(EditKind::Change, 3, 4, 3, 3).to_string(), "3,4c3");
        assert_eq!(span(EditKind::Insert, 6, 5, 6, 7).to_string(), "5a6,7");
        assert_eq!(span(EditKind::Delete, 2, 2, 2, 1).to_string(), "2d1");
    }
}
