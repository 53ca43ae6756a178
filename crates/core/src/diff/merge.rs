//! Three-way merge with conflict markers.
//!
//! Walks the diff3 ranges in order, copying unchanged ancestor lines through
//! and taking each side's edit where only one side (or both, identically)
//! changed a region. Conflicting regions are diffed yours-against-theirs so
//! that lines both sides agree on are emitted once and only the diverging
//! pieces end up between markers:
//!
//! ```text
//! <<<<<<<
//! yours' lines
//! =======
//! theirs' lines
//! >>>>>>>
//! ```

use tracing::debug;

use super::diff3::{Diff3Engine, Diff3Kind, Diff3Range};
use super::heckel::LineDiff;

/// Opens a conflict block; yours' lines follow.
pub const MARKER_YOURS: &str = "<<<<<<<";
/// Separates yours' lines from theirs' lines.
pub const MARKER_SEPARATOR: &str = "=======";
/// Closes a conflict block.
pub const MARKER_THEIRS: &str = ">>>>>>>";

/// The outcome of a three-way merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Merged lines; contains conflict markers when `conflict_count > 0`.
    pub lines: Vec<String>,
    /// Number of marker blocks emitted.
    pub conflict_count: usize,
}

impl MergeResult {
    pub fn has_conflicts(&self) -> bool {
        self.conflict_count > 0
    }
}

/// Stateless merge engine.
pub struct MergeResolver;

impl MergeResolver {
    /// Merge `yours` and `theirs`, both derived from `ancestor`.
    pub fn merge<S: AsRef<str>>(yours: &[S], ancestor: &[S], theirs: &[S]) -> MergeResult {
        let ranges = Diff3Engine::diff3(yours, ancestor, theirs);
        let result = Self::resolve(&ranges, yours, ancestor, theirs);
        debug!(
            ranges = ranges.len(),
            lines = result.lines.len(),
            conflicts = result.conflict_count,
            "three-way merge complete"
        );
        result
    }

    /// Build the merged output from precomputed diff3 `ranges`.
    pub fn resolve<S: AsRef<str>>(
        ranges: &[Diff3Range],
        yours: &[S],
        ancestor: &[S],
        theirs: &[S],
    ) -> MergeResult {
        let mut out = Output::default();
        let mut next_ancestor = 0;

        for range in ranges {
            // Ancestor lines untouched by either side.
            out.extend(&ancestor[next_ancestor..range.lo_ancestor - 1]);
            match range.kind {
                Diff3Kind::YoursOnly => out.extend(&yours[range.yours()]),
                Diff3Kind::TheirsOnly | Diff3Kind::BothSame => out.extend(&theirs[range.theirs()]),
                Diff3Kind::Conflict => out.conflict_region(&yours[range.yours()], &theirs[range.theirs()]),
            }
            next_ancestor = range.hi_ancestor;
        }
        out.extend(&ancestor[next_ancestor..]);

        MergeResult {
            lines: out.lines,
            conflict_count: out.conflicts,
        }
    }
}

#[derive(Default)]
struct Output {
    lines: Vec<String>,
    conflicts: usize,
}

impl Output {
    fn extend<S: AsRef<str>>(&mut self, lines: &[S]) {
        self.lines.extend(lines.iter().map(|l| l.as_ref().to_string()));
    }

    /// Emit a region both sides changed differently.
    fn conflict_region<S: AsRef<str>>(&mut self, yours: &[S], theirs: &[S]) {
        let mut next = 0;
        for span in LineDiff::diff(yours, theirs) {
            // Lines both sides agree on.
            self.extend(&yours[next..span.lo_a - 1]);
            self.conflict_block(&yours[span.range_a()], &theirs[span.range_b()]);
            next = span.hi_a;
        }
        self.extend(&yours[next..]);
    }

    fn conflict_block<S: AsRef<str>>(&mut self, yours: &[S], theirs: &[S]) {
        self.conflicts += 1;
        self.lines.push(MARKER_YOURS.to_string());
        self.extend(yours);
        self.lines.push(MARKER_SEPARATOR.to_string());
        self.extend(theirs);
        self.lines.push(MARKER_THEIRS.to_string());
    }
}
