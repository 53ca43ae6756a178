//! `templsync tags`: list the template's releases.

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use templsync_core::config::TemplateConfig;
use templsync_core::release::TagClient;

use super::style;

pub async fn run_tags(config: &TemplateConfig) -> Result<()> {
    let client = TagClient::new(
        &config.template.api_url,
        &config.template.repo,
        config.template.token.clone(),
    )
    .context("failed to create API client")?;

    let spinner = super::spinner(format!("Fetching tags of {}...", config.template.repo));
    let tags = client.list_tags().await;
    spinner.finish_and_clear();
    let tags = tags.context("failed to fetch template tags")?;

    if tags.is_empty() {
        println!("{}", style::warn("The template repository has no releases"));
        return Ok(());
    }

    let prefix = &config.template.tag_prefix;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Tag", "Version", "Archive"]);
    for tag in &tags {
        let version = tag.version(prefix);
        let version_cell = if version == config.template.version {
            Cell::new(format!("{} (current)", version)).fg(comfy_table::Color::Green)
        } else {
            Cell::new(version)
        };
        table.add_row(vec![Cell::new(&tag.name), version_cell, Cell::new(&tag.archive_url)]);
    }

    println!();
    println!("{}", style::header(&format!("Releases of {} ({})", config.template.repo, tags.len())));
    println!("{}", table);
    println!("{}", style::dim("Newest first."));
    println!();
    Ok(())
}
