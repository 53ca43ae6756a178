//! Ignore patterns for the tree walk.
//!
//! Provides [`PathPolicy`], built from `update.ignore_patterns`, which decides
//! whether a relative path takes part in classification at all. Ignored paths
//! never produce a [`super::FileOperation`].

use tracing::debug;

/// Glob-based ignore rules, matched against forward-slash relative paths.
#[derive(Debug, Clone, Default)]
pub struct PathPolicy {
    ignore_patterns: Vec<String>,
}

impl PathPolicy {
    pub fn new(ignore_patterns: Vec<String>) -> Self {
        Self { ignore_patterns }
    }

    /// Whether `rel_path` (or any directory above it) matches an ignore
    /// pattern.
    ///
    /// Supports:
    /// - `*.ext` -- match by extension at the top level
    /// - `**/*.ext` -- match by extension anywhere
    /// - `dir` or `dir/**` -- match everything under a directory
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        let path = rel_path.replace('\\', "/");
        for pattern in &self.ignore_patterns {
            let pat = pattern.replace('\\', "/");
            if prefixes(&path).any(|candidate| glob_match::glob_match(&pat, candidate)) {
                debug!(path = %path, pattern = %pat, "path matches ignore pattern");
                return true;
            }
        }
        false
    }
}

/// `a/b/c` yields `a`, `a/b`, `a/b/c`.
fn prefixes(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/')
        .map(move |(i, _)| &path[..i])
        .chain(std::iter::once(path))
}
