//! Error types for the templsync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.
//!
//! Unresolvable merge conflicts are *not* errors: they are reported as
//! [`crate::tree::FileAction::Unresolvable`] or as conflicted merges inside an
//! [`crate::tree::UpdatePlan`].

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Update(#[from] UpdateError),

    #[error(transparent)]
    Apply(#[from] ApplyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Release(#[from] ReleaseError),
}

// ---------------------------------------------------------------------------
// Classification errors
// ---------------------------------------------------------------------------

/// Fatal errors raised while walking and diffing the three trees.
///
/// Any of these aborts the run before a single file operation is performed,
/// so the working tree is left untouched.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// One of the three roots does not exist or is not a directory.
    #[error("{role} root not found at '{}'", .path.display())]
    RootNotFound { role: &'static str, path: PathBuf },

    /// A file could not be read or inspected.
    #[error("I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed.
    #[error("directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

impl UpdateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Apply errors
// ---------------------------------------------------------------------------

/// A single file operation failed while being applied.
///
/// These are collected per path in an [`crate::tree::ApplyReport`]; they never
/// stop the remaining operations.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("failed to apply change to '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ApplyError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Release errors
// ---------------------------------------------------------------------------

/// Errors from fetching and materializing template releases.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("release HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("release API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// No tag matches the requested version.
    #[error("no release tag found for version '{0}'")]
    VersionNotFound(String),

    /// The repository has no tags at all.
    #[error("the template repository has no releases")]
    NoReleases,

    /// A `git2` library error during clone or checkout.
    #[error("release git error: {0}")]
    Git(#[from] git2::Error),

    /// Generic I/O wrapper.
    #[error("release I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
