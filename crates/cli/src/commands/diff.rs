//! `templsync diff`: two-way line diff in normal-diff format.

use std::path::Path;

use anyhow::{Context, Result};

use templsync_core::diff::{EditKind, LineDiff};
use templsync_core::text::TextFile;

/// Print the diff of `a` against `b`. Returns `true` when they are equal.
pub fn run_diff(a: &Path, b: &Path) -> Result<bool> {
    let a = TextFile::load(a).with_context(|| format!("failed to read {}", a.display()))?;
    let b = TextFile::load(b).with_context(|| format!("failed to read {}", b.display()))?;
    let output = render_diff(a.lines(), b.lines());
    print!("{}", output);
    Ok(output.is_empty())
}

fn render_diff(a: &[String], b: &[String]) -> String {
    let mut out = String::new();
    for span in LineDiff::diff(a, b) {
        out.push_str(&format!("{}\n", span));
        for line in &a[span.range_a()] {
            out.push_str(&format!("< {}\n", line));
        }
        if span.kind == EditKind::Change {
            out.push_str("---\n");
        }
        for line in &b[span.range_b()] {
            out.push_str(&format!("> {}\n", line));
        }
    }
    out
}
