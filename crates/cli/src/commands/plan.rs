//! `templsync plan`: classify three local directories without any network
//! access, optionally applying the result.

use std::path::Path;

use anyhow::{Context, Result};

use templsync_core::tree::{TreeClassifier, TreeRoots};

use super::style;

pub fn run_plan(ancestor: &Path, target: &Path, current: &Path, apply: bool, yes: bool) -> Result<()> {
    let plan = TreeClassifier::new(TreeRoots::new(ancestor, target, current))
        .classify()
        .context("failed to classify directory trees")?;

    if plan.is_empty() {
        println!("{}", style::success("Nothing to do: the working copy is up to date"));
        return Ok(());
    }
    super::print_plan(&plan);

    if !apply {
        println!("{}", style::dim("Re-run with --apply to perform these changes."));
        return Ok(());
    }
    if !yes && !super::confirm("Apply these changes?")? {
        println!("{}", style::warn("Cancelled. No files were changed."));
        return Ok(());
    }
    if !super::apply_plan(&plan) {
        anyhow::bail!("some files could not be updated");
    }
    Ok(())
}
