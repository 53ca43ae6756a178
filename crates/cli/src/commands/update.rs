//! `templsync update`: bring the project up to a newer template release.
//!
//! Every network and checkout step finishes before classification starts,
//! and nothing is written until the user confirms the printed plan.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use templsync_core::config::TemplateConfig;
use templsync_core::errors::ReleaseError;
use templsync_core::release::{find_version, latest, ReleaseCache, TagClient};
use templsync_core::tree::{PathPolicy, TreeClassifier, TreeRoots};

use super::style;

#[derive(Debug, Default)]
pub struct UpdateOptions {
    pub yes: bool,
    pub target_version: Option<String>,
    pub ignore_cache: bool,
    pub dry_run: bool,
    pub project_dir: Option<PathBuf>,
}

pub async fn run_update(config_path: &Path, config: &TemplateConfig, opts: UpdateOptions) -> Result<()> {
    let base_dir = super::config_dir(config_path);
    let project_dir = opts.project_dir.clone().unwrap_or_else(|| base_dir.clone());
    let prefix = config.template.tag_prefix.as_str();
    let current_version = config.template.version.as_str();

    // -----------------------------------------------------------------
    // 1. Resolve both releases
    // -----------------------------------------------------------------
    let client = TagClient::new(
        &config.template.api_url,
        &config.template.repo,
        config.template.token.clone(),
    )
    .context("failed to create API client")?;

    let spinner = super::spinner("Fetching template releases...");
    let tags = client.list_tags().await;
    spinner.finish_and_clear();
    let tags = tags.context("failed to fetch template tags")?;

    let target = match opts.target_version.as_deref() {
        Some(version) => find_version(&tags, version, prefix)?,
        None => latest(&tags)?,
    };
    if target.version(prefix) == current_version {
        println!(
            "{}",
            style::success(&format!("Already at template version {}", current_version))
        );
        return Ok(());
    }
    let ancestor = find_version(&tags, current_version, prefix)
        .context("the project's template.version is not a release of the template")?;

    println!(
        "Updating template from {} to {}",
        style::header(ancestor.version(prefix)),
        style::header(target.version(prefix))
    );

    // -----------------------------------------------------------------
    // 2. Materialize them
    // -----------------------------------------------------------------
    let cache = if opts.ignore_cache || !config.update.use_cache {
        ReleaseCache::temporary().context("failed to create temporary cache")?
    } else {
        ReleaseCache::new(config.update.resolved_cache_dir(&base_dir))
    };
    info!(cache = %cache.root().display(), "using release cache");

    let clone_url = config.template.clone_url();
    let token = config.template.token.clone();
    let (ancestor_tag, target_tag) = (ancestor.clone(), target.clone());

    let spinner = super::spinner("Downloading template releases...");
    let materialized = tokio::task::spawn_blocking(move || -> Result<_, ReleaseError> {
        let ancestor_dir = cache.materialize(&clone_url, &ancestor_tag, token.as_deref())?;
        let target_dir = cache.materialize(&clone_url, &target_tag, token.as_deref())?;
        Ok((cache, ancestor_dir, target_dir))
    })
    .await;
    spinner.finish_and_clear();
    // The cache is held until the end so a temporary one outlives the update.
    let (_cache, ancestor_dir, target_dir) = materialized
        .context("release download task failed")?
        .context("failed to download template releases")?;

    // -----------------------------------------------------------------
    // 3. Classify
    // -----------------------------------------------------------------
    let plan = TreeClassifier::new(TreeRoots::new(ancestor_dir, target_dir, &project_dir))
        .with_policy(PathPolicy::new(config.update.ignore_patterns.clone()))
        .classify()
        .context("failed to compare template releases with the project")?;

    if plan.is_empty() {
        println!("{}", style::success("The project already contains every template change"));
        remind_version_bump(config_path, target.version(prefix));
        return Ok(());
    }
    super::print_plan(&plan);

    if opts.dry_run {
        println!("{}", style::dim("Dry run: no files were changed."));
        return Ok(());
    }
    if !opts.yes && !super::confirm("Apply these changes?")? {
        println!("{}", style::warn("Update cancelled. No files were changed."));
        return Ok(());
    }

    // -----------------------------------------------------------------
    // 4. Apply
    // -----------------------------------------------------------------
    let ok = super::apply_plan(&plan);
    remind_version_bump(config_path, target.version(prefix));
    if !ok {
        anyhow::bail!("some files could not be updated");
    }
    Ok(())
}

fn remind_version_bump(config_path: &Path, version: &str) {
    println!();
    println!(
        "{}",
        style::warn(&format!(
            "Remember to set template.version = \"{}\" in {}",
            version,
            config_path.display()
        ))
    );
}
