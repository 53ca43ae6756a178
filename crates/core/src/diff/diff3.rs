//! Three-way diff: combine `ancestor→yours` and `ancestor→theirs` edit spans
//! into classified ranges over the ancestor's coordinate space.
//!
//! The grouping walk follows GNU diff3: repeatedly take the side whose next
//! span starts first in the ancestor, then keep absorbing spans from the other
//! side while they overlap the growing interval. The resulting ancestor
//! interval is translated to yours/theirs coordinates using the offset of the
//! span at each end, or, for a side with no span in the range, the offset left
//! behind by the previous range.

use std::collections::VecDeque;

use tracing::trace;

use super::heckel::{EditSpan, LineDiff};

/// Classification of a [`Diff3Range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diff3Kind {
    /// Only yours changed this region.
    YoursOnly,
    /// Only theirs changed this region.
    TheirsOnly,
    /// Both changed it identically.
    BothSame,
    /// Both changed it differently.
    Conflict,
}

/// A changed region, 1-indexed and inclusive in all three sequences.
///
/// Ranges are ordered and non-overlapping in ancestor coordinates; ancestor
/// lines between two ranges are unchanged on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diff3Range {
    pub kind: Diff3Kind,
    pub lo_yours: usize,
    pub hi_yours: usize,
    pub lo_theirs: usize,
    pub hi_theirs: usize,
    pub lo_ancestor: usize,
    pub hi_ancestor: usize,
}

impl Diff3Range {
    /// 0-based half-open index range into yours.
    pub fn yours(&self) -> std::ops::Range<usize> {
        self.lo_yours - 1..self.hi_yours
    }

    /// 0-based half-open index range into theirs.
    pub fn theirs(&self) -> std::ops::Range<usize> {
        self.lo_theirs - 1..self.hi_theirs
    }

    /// 0-based half-open index range into the ancestor.
    pub fn ancestor(&self) -> std::ops::Range<usize> {
        self.lo_ancestor - 1..self.hi_ancestor
    }
}

const YOURS: usize = 0;
const THEIRS: usize = 1;

/// Stateless three-way diff engine.
pub struct Diff3Engine;

impl Diff3Engine {
    /// Compute the diff3 ranges of `yours` and `theirs` against `ancestor`.
    pub fn diff3<S: AsRef<str>>(yours: &[S], ancestor: &[S], theirs: &[S]) -> Vec<Diff3Range> {
        let mut pending: [VecDeque<EditSpan>; 2] = [
            LineDiff::diff(ancestor, yours).into(),
            LineDiff::diff(ancestor, theirs).into(),
        ];

        let mut ranges: Vec<Diff3Range> = Vec::new();
        while let Some(group) = next_group(&mut pending) {
            let previous = ranges.last().copied();
            let range = translate(&group, previous, yours, theirs);
            trace!(?range, "diff3 range");
            ranges.push(range);
        }
        ranges
    }
}

/// Spans from each side that make up one diff3 range.
struct Group {
    spans: [Vec<EditSpan>; 2],
    lo_ancestor: usize,
    hi_ancestor: usize,
}

/// Pop the next group of mutually overlapping spans off both queues.
fn next_group(pending: &mut [VecDeque<EditSpan>; 2]) -> Option<Group> {
    // The side starting earliest in the ancestor goes first; yours wins ties.
    let first = match (pending[YOURS].front(), pending[THEIRS].front()) {
        (None, None) => return None,
        (Some(y), Some(t)) if y.lo_a <= t.lo_a => YOURS,
        (Some(_), None) => YOURS,
        _ => THEIRS,
    };

    let head = pending[first].pop_front()?;
    let lo = head.lo_a;
    let mut hi = head.hi_a;
    let mut spans: [Vec<EditSpan>; 2] = [Vec::new(), Vec::new()];
    spans[first].push(head);

    let mut other = 1 - first;
    while let Some(&next) = pending[other].front() {
        if !touches(lo, hi, &next) {
            break;
        }
        pending[other].pop_front();
        spans[other].push(next);
        if next.hi_a > hi {
            hi = next.hi_a;
            other = 1 - other;
        }
    }

    Some(Group {
        spans,
        lo_ancestor: lo,
        hi_ancestor: hi,
    })
}

/// Whether `next` must join the interval `lo..=hi` that is being grown.
///
/// Overlapping intervals always join. Merely adjacent ones join only when an
/// empty (pure insertion) interval sits at the seam, since an insertion next
/// to an edit cannot be ordered relative to it.
fn touches(lo: usize, hi: usize, next: &EditSpan) -> bool {
    if next.lo_a <= hi {
        return true;
    }
    let interval_is_insertion = hi + 1 == lo;
    let next_is_insertion = next.hi_a + 1 == next.lo_a;
    next.lo_a == hi + 1 && (interval_is_insertion || next_is_insertion)
}

fn translate<S: AsRef<str>>(
    group: &Group,
    previous: Option<Diff3Range>,
    yours: &[S],
    theirs: &[S],
) -> Diff3Range {
    let (lo2, hi2) = (group.lo_ancestor, group.hi_ancestor);

    let side_range = |side: usize| -> (usize, usize) {
        let spans = &group.spans[side];
        match (spans.first(), spans.last()) {
            (Some(first), Some(last)) => (lo2 + first.lo_b - first.lo_a, hi2 + last.hi_b - last.hi_a),
            _ => {
                // Unchanged on this side: keep the offset of the previous range.
                let (side_hi, anc_hi) = match previous {
                    Some(p) if side == YOURS => (p.hi_yours, p.hi_ancestor),
                    Some(p) => (p.hi_theirs, p.hi_ancestor),
                    None => (0, 0),
                };
                (lo2 + side_hi - anc_hi, hi2 + side_hi - anc_hi)
            }
        }
    };
    let (lo0, hi0) = side_range(YOURS);
    let (lo1, hi1) = side_range(THEIRS);

    let kind = if group.spans[YOURS].is_empty() {
        Diff3Kind::TheirsOnly
    } else if group.spans[THEIRS].is_empty() {
        Diff3Kind::YoursOnly
    } else if yours[lo0 - 1..hi0]
        .iter()
        .map(AsRef::as_ref)
        .eq(theirs[lo1 - 1..hi1].iter().map(AsRef::as_ref))
    {
        Diff3Kind::BothSame
    } else {
        Diff3Kind::Conflict
    };

    Diff3Range {
        kind,
        lo_yours: lo0,
        hi_yours: hi0,
        lo_theirs: lo1,
        hi_theirs: hi1,
        lo_ancestor: lo2,
        hi_ancestor: hi2,
    }
}
