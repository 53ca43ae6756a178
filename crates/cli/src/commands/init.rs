//! `templsync init`: write a starter config file.

use std::path::Path;

use anyhow::{Context, Result};

use templsync_core::config::TemplateConfig;

use super::style;

pub fn run_init(output: &Path) -> Result<()> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, TemplateConfig::default_template())
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "{}",
        style::success(&format!("Default configuration written to {}", output.display()))
    );
    println!();
    println!("Next steps:");
    println!("  1. Set template.repo and the template.version this project was generated from");
    println!("  2. List the available releases: templsync tags");
    println!("  3. Preview an update: templsync update --dry-run");
    Ok(())
}
