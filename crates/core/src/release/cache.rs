//! Local cache of materialized template releases.
//!
//! Each release is checked out once into `<root>/<tag>` and reused by later
//! runs. A temporary cache lives only as long as the [`ReleaseCache`] value.

use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{Cred, FetchOptions, RemoteCallbacks, Repository};
use tempfile::TempDir;
use tracing::{debug, info, instrument};

use super::tags::Tag;
use crate::errors::ReleaseError;

pub struct ReleaseCache {
    root: PathBuf,
    // Keeps a temporary cache alive; removed on drop.
    _temp: Option<TempDir>,
}

impl ReleaseCache {
    /// Persistent cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            _temp: None,
        }
    }

    /// Throwaway cache in a fresh temporary directory.
    pub fn temporary() -> Result<Self, ReleaseError> {
        let temp = TempDir::new()?;
        Ok(Self {
            root: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the checked-out tree of `tag_name`.
    pub fn version_dir(&self, tag_name: &str) -> PathBuf {
        self.root.join(tag_name)
    }

    pub fn contains(&self, tag_name: &str) -> bool {
        self.version_dir(tag_name).is_dir()
    }

    /// Create the cache directory, with a `.gitignore` that keeps it out of
    /// the project's own repository.
    pub fn prepare(&self) -> Result<(), ReleaseError> {
        std::fs::create_dir_all(&self.root)?;
        let gitignore = self.root.join(".gitignore");
        if !gitignore.exists() {
            std::fs::write(&gitignore, "*\n")?;
            debug!(path = %gitignore.display(), "wrote cache .gitignore");
        }
        Ok(())
    }

    /// Return the checked-out tree of `tag`, fetching it from `clone_url` if
    /// it is not cached yet. The returned directory contains no `.git`.
    #[instrument(skip(self, token), fields(tag = %tag.name))]
    pub fn materialize(
        &self,
        clone_url: &str,
        tag: &Tag,
        token: Option<&str>,
    ) -> Result<PathBuf, ReleaseError> {
        let dir = self.version_dir(&tag.name);
        if dir.is_dir() {
            info!(path = %dir.display(), "release found in cache");
            return Ok(dir);
        }
        self.prepare()?;

        // Fetch and check out under a scratch directory, then move the tree
        // into place so an interrupted run never leaves a partial release.
        let scratch = tempfile::Builder::new()
            .prefix(".fetch-")
            .tempdir_in(&self.root)?;
        let repo = Repository::init(scratch.path().join("repo"))?;
        fetch_tag(&repo, clone_url, &tag.name, token)?;

        let staged = scratch.path().join("tree");
        std::fs::create_dir_all(&staged)?;
        checkout_tag(&repo, &tag.name, &staged)?;
        if let Some(parent) = dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(&staged, &dir)?;

        info!(path = %dir.display(), "release materialized");
        Ok(dir)
    }
}

fn fetch_tag(repo: &Repository, url: &str, tag_name: &str, token: Option<&str>) -> Result<(), ReleaseError> {
    let mut callbacks = RemoteCallbacks::new();
    if let Some(tok) = token {
        let tok = tok.to_string();
        callbacks.credentials(move |_url, _username, _allowed| {
            Cred::userpass_plaintext("x-access-token", &tok)
        });
    }
    let mut fetch_opts = FetchOptions::new();
    fetch_opts.remote_callbacks(callbacks);

    let refspec = format!("+refs/tags/{0}:refs/tags/{0}", tag_name);
    let mut remote = repo.remote_anonymous(url)?;
    remote.fetch(&[refspec.as_str()], Some(&mut fetch_opts), None)?;
    debug!(url, tag = tag_name, "fetched tag");
    Ok(())
}

fn checkout_tag(repo: &Repository, tag_name: &str, target: &Path) -> Result<(), ReleaseError> {
    let commit = repo
        .revparse_single(&format!("refs/tags/{}", tag_name))?
        .peel_to_commit()?;
    let tree = commit.tree()?;
    let mut checkout = CheckoutBuilder::new();
    checkout.force().target_dir(target);
    repo.checkout_tree(tree.as_object(), Some(&mut checkout))?;
    debug!(commit = %commit.id(), target = %target.display(), "checked out tag");
    Ok(())
}
