//! Project configuration (`templsync.toml`).
//!
//! Records which template release the project was generated from and where
//! that template lives, plus options for the update run itself.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

/// Default config file name, looked up in the project directory.
pub const DEFAULT_CONFIG_FILE: &str = "templsync.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Template repository and the local version marker.
    pub template: TemplateSection,

    /// Update behaviour options.
    #[serde(default)]
    pub update: UpdateSection,
}

// ---------------------------------------------------------------------------
// Template section
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSection {
    /// Template version the working copy was last generated or updated from,
    /// without the tag prefix (e.g. `1.2.0`).
    pub version: String,

    /// Template repository in `owner/name` format.
    pub repo: String,

    /// GitHub API base URL (default `https://api.github.com`).
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Explicit Git clone base URL. Overrides the derivation from `api_url`.
    #[serde(default)]
    pub git_base_url: Option<String>,

    /// Prefix of release tags; tag `v1.2.0` is version `1.2.0`.
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,

    /// Environment variable holding an API token, for private templates or
    /// higher rate limits.
    #[serde(default)]
    pub token_env: Option<String>,

    /// Resolved token (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub token: Option<String>,
}

impl TemplateSection {
    /// HTTPS clone URL of the template repository.
    pub fn clone_url(&self) -> String {
        crate::release::remote_url::derive_git_remote_url(
            &self.api_url,
            self.git_base_url.as_deref(),
            &self.repo,
        )
    }
}

fn default_api_url() -> String {
    "https://api.github.com".into()
}

fn default_tag_prefix() -> String {
    "v".into()
}

// ---------------------------------------------------------------------------
// Update section
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSection {
    /// Where downloaded releases are kept. Relative paths are resolved
    /// against the config file's directory.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Reuse releases already present in the cache.
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Glob patterns of paths excluded from the update.
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

impl Default for UpdateSection {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            use_cache: true,
            ignore_patterns: Vec::new(),
        }
    }
}

impl UpdateSection {
    /// The cache directory, anchored at `base` when relative.
    pub fn resolved_cache_dir(&self, base: &Path) -> PathBuf {
        if self.cache_dir.is_absolute() {
            self.cache_dir.clone()
        } else {
            base.join(&self.cache_dir)
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".template_cache")
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl TemplateConfig {
    /// Load a [`TemplateConfig`] from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: TemplateConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve `token_env` from the environment. A missing variable only
    /// logs a warning; public templates need no token.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(env_name) = self.template.token_env.as_deref() {
            self.template.token = resolve_optional_env(env_name, "template.token_env");
        }
        Ok(())
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.template.version.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "template.version".into(),
                detail: "template version must not be empty".into(),
            });
        }
        if self.template.repo.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "template.repo".into(),
                detail: "template repo must not be empty".into(),
            });
        }
        match self.template.repo.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {}
            _ => {
                return Err(ConfigError::InvalidValue {
                    field: "template.repo".into(),
                    detail: "template repo must be in 'owner/name' format".into(),
                })
            }
        }
        if self.template.api_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "template.api_url".into(),
                detail: "API URL must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Generate a default TOML config template string.
    pub fn default_template() -> &'static str {
        r#"# templsync configuration

[template]
# Template release this project was generated from (without the tag prefix).
version = "0.1.0"
repo = "owner/template"
api_url = "https://api.github.com"
# git_base_url = "https://git.example.com"
tag_prefix = "v"
# token_env = "GITHUB_TOKEN"

[update]
# cache_dir = ".template_cache"
use_cache = true
ignore_patterns = []
"#
    }
}

/// Try to read an environment variable by name.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
