//! `templsync merge`: three-way merge of single files.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use templsync_core::diff::{MergeResolver, MergeResult};
use templsync_core::text::{render_lines, TextFile};

use super::style;

/// Merge `theirs` into `yours` relative to `ancestor`, writing the result to
/// `output` or stdout. Returns `false` when conflict markers were emitted.
pub fn run_merge(yours: &Path, ancestor: &Path, theirs: &Path, output: Option<&Path>) -> Result<bool> {
    let (result, rendered) = merge_files(yours, ancestor, theirs)?;

    match output {
        Some(path) => std::fs::write(path, &rendered)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => std::io::stdout()
            .lock()
            .write_all(rendered.as_bytes())
            .context("failed to write to stdout")?,
    }

    if result.has_conflicts() {
        eprintln!(
            "{}",
            style::warn(&format!("{} conflict(s) left with markers", result.conflict_count))
        );
        return Ok(false);
    }
    Ok(true)
}

/// Load the three files and merge them, keeping yours' line endings.
fn merge_files(yours: &Path, ancestor: &Path, theirs: &Path) -> Result<(MergeResult, String)> {
    let load = |path: &Path| {
        TextFile::load(path).with_context(|| format!("failed to read {}", path.display()))
    };
    let (yours, ancestor, theirs) = (load(yours)?, load(ancestor)?, load(theirs)?);

    let result = MergeResolver::merge(yours.lines(), ancestor.lines(), theirs.lines());
    let rendered = render_lines(&result.lines, yours.line_ending());
    Ok((result, rendered))
}
