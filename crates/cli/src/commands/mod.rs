//! templsync subcommands.

pub mod diff;
pub mod init;
pub mod merge;
pub mod plan;
pub mod style;
pub mod tags;
pub mod update;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use templsync_core::config::TemplateConfig;
use templsync_core::tree::{StatusCode, UpdatePlan};

/// Load, resolve, and validate the project config.
pub fn load_config(config_path: &Path) -> Result<TemplateConfig> {
    TemplateConfig::load_and_resolve(config_path).with_context(|| {
        format!(
            "failed to load configuration from {} (create one with `templsync init`)",
            config_path.display()
        )
    })
}

/// Directory containing the config file; relative paths in the config are
/// anchored here.
pub fn config_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Expand `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(msg.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Ask a yes/no question, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .context("failed to read confirmation")
}

/// Print every operation of `plan` followed by a per-code summary table.
pub fn print_plan(plan: &UpdatePlan) {
    println!();
    println!("{}", style::header(&format!("Changes ({})", plan.len())));
    for op in plan.operations() {
        println!("  {}", style::operation(op));
    }
    println!();

    let summary = plan.summary();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Code", "Meaning", "Files"]);
    for code in StatusCode::ALL {
        if let Some(count) = summary.get(&code) {
            table.add_row(vec![
                Cell::new(style::code_style(code).apply_to(code.as_str()).to_string()),
                Cell::new(describe(code)),
                Cell::new(count),
            ]);
        }
    }
    println!("{}", table);
    println!();
}

fn describe(code: StatusCode) -> &'static str {
    match code {
        StatusCode::New => "added from the template",
        StatusCode::Deleted => "removed by the template",
        StatusCode::Modified => "replaced with the template's version",
        StatusCode::Merged => "merged with local edits",
        StatusCode::Conflict => "merged with conflict markers",
        StatusCode::Error => "left untouched, needs manual update",
    }
}

/// Apply `plan` and report failures and paths that need manual attention.
///
/// Returns `true` when every operation succeeded.
pub fn apply_plan(plan: &UpdatePlan) -> bool {
    let report = plan.apply();

    for (path, err) in &report.failed {
        println!("{}", style::error(&format!("{}: {}", path, err)));
    }
    println!(
        "{}",
        style::success(&format!("{} file operation(s) applied", report.applied))
    );

    let conflicted = plan.conflicted_paths();
    if !conflicted.is_empty() {
        println!();
        println!(
            "{}",
            style::warn("The following files need manual attention (look for <<<<<<< markers):")
        );
        for path in conflicted {
            println!("  {}", path);
        }
    }
    report.is_success()
}
