//! templsync command-line tool.
//!
//! Keeps a project generated from a versioned template in step with newer
//! template releases, merging upstream changes into locally edited files.
//! Also exposes the merge engine directly for single files and local trees.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::update::UpdateOptions;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// templsync command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "templsync",
    version,
    about = "Update a project generated from a template to a newer template release"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "templsync.toml")]
    config: PathBuf,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file (defaults to --config).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the template's releases, newest first.
    Tags,

    /// Update the project to a newer template release.
    Update {
        /// Apply without asking for confirmation.
        #[arg(short, long)]
        yes: bool,

        /// Version to update to (defaults to the newest release).
        #[arg(long)]
        target_version: Option<String>,

        /// Download releases into a temporary directory instead of the cache.
        #[arg(long)]
        ignore_cache: bool,

        /// Show the changes without applying them.
        #[arg(long)]
        dry_run: bool,

        /// Project directory (defaults to the config file's directory).
        #[arg(long)]
        project_dir: Option<PathBuf>,
    },

    /// Compare three local directories and show (or apply) the update.
    Plan {
        /// Old template tree.
        #[arg(long)]
        ancestor: PathBuf,

        /// New template tree.
        #[arg(long)]
        target: PathBuf,

        /// Working copy to update.
        #[arg(long, default_value = ".")]
        current: PathBuf,

        /// Perform the changes.
        #[arg(long)]
        apply: bool,

        /// Apply without asking for confirmation.
        #[arg(short, long)]
        yes: bool,
    },

    /// Three-way merge of single files.
    Merge {
        /// Locally edited file.
        yours: PathBuf,
        /// Common ancestor.
        ancestor: PathBuf,
        /// Upstream file.
        theirs: PathBuf,

        /// Write the result here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Line diff of two files.
    Diff { a: PathBuf, b: PathBuf },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = commands::expand_tilde(&cli.config);

    match cli.command {
        Commands::Init { output } => {
            let output = output.map_or_else(|| config_path.clone(), |p| commands::expand_tilde(&p));
            commands::init::run_init(&output)?;
        }
        Commands::Tags => {
            let config = commands::load_config(&config_path)?;
            commands::tags::run_tags(&config).await?;
        }
        Commands::Update {
            yes,
            target_version,
            ignore_cache,
            dry_run,
            project_dir,
        } => {
            let config = commands::load_config(&config_path)?;
            let opts = UpdateOptions {
                yes,
                target_version,
                ignore_cache,
                dry_run,
                project_dir,
            };
            commands::update::run_update(&config_path, &config, opts).await?;
        }
        Commands::Plan {
            ancestor,
            target,
            current,
            apply,
            yes,
        } => commands::plan::run_plan(&ancestor, &target, &current, apply, yes)?,
        Commands::Merge {
            yours,
            ancestor,
            theirs,
            output,
        } => {
            if !commands::merge::run_merge(&yours, &ancestor, &theirs, output.as_deref())? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Diff { a, b } => {
            if !commands::diff::run_diff(&a, &b)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
