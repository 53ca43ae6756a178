//! Line-based diffing and three-way merging.
//!
//! 1. **Two-way diff** -- [`LineDiff`], Heckel's unique-line algorithm.
//! 2. **Three-way diff** -- [`Diff3Engine`], combining two diffs against a
//!    common ancestor into classified ranges.
//! 3. **Merge** -- [`MergeResolver`], emitting merged lines and conflict
//!    markers.

pub mod diff3;
pub mod heckel;
pub mod merge;

pub use diff3::{Diff3Engine, Diff3Kind, Diff3Range};
pub use heckel::{EditKind, EditSpan, LineDiff};
pub use merge::{MergeResolver, MergeResult, MARKER_SEPARATOR, MARKER_THEIRS, MARKER_YOURS};
