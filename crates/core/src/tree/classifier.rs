//! Three-tree classification.
//!
//! The ancestor and target trees are walked in full; the working copy is only
//! consulted at the paths the two releases mention, so files that exist only
//! in the working copy are never looked at, let alone touched.
//!
//! Every file is loaded and compared as normalized lines, and all merges are
//! computed here. Symbolic links are never followed: they are compared by the
//! path they point to and are never merged. Nothing is written: the resulting [`UpdatePlan`] can be shown
//! as a dry run or applied.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use super::operation::{FileAction, FileOperation, UnresolvableReason};
use super::policy::PathPolicy;
use super::UpdatePlan;
use crate::diff::MergeResolver;
use crate::errors::UpdateError;
use crate::text::TextFile;

/// The three directory roots of an update.
#[derive(Debug, Clone)]
pub struct TreeRoots {
    /// Release the working copy was generated from.
    pub ancestor: PathBuf,
    /// Release being updated to.
    pub target: PathBuf,
    /// The working copy.
    pub current: PathBuf,
}

impl TreeRoots {
    pub fn new(
        ancestor: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
        current: impl Into<PathBuf>,
    ) -> Self {
        Self {
            ancestor: ancestor.into(),
            target: target.into(),
            current: current.into(),
        }
    }

    fn check(&self) -> Result<(), UpdateError> {
        for (role, path) in [
            ("ancestor", &self.ancestor),
            ("target", &self.target),
            ("current", &self.current),
        ] {
            if !path.is_dir() {
                return Err(UpdateError::RootNotFound {
                    role,
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Dir,
    Symlink,
}

impl EntryKind {
    fn of(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Dir
        } else {
            Self::File
        }
    }
}

/// What a path holds, as far as comparison is concerned.
enum Content {
    Text(TextFile),
    Link(PathBuf),
}

impl Content {
    fn load(path: &Path, kind: EntryKind) -> Result<Self, UpdateError> {
        match kind {
            EntryKind::Symlink => std::fs::read_link(path)
                .map(Self::Link)
                .map_err(|e| UpdateError::io(path, e)),
            _ => Ok(Self::Text(TextFile::load(path)?)),
        }
    }

    fn same(&self, other: &Content) -> bool {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.same_lines(b),
            (Self::Link(a), Self::Link(b)) => a == b,
            _ => false,
        }
    }
}

/// Decides, per path, how to bring the working copy from the ancestor release
/// to the target release.
pub struct TreeClassifier {
    roots: TreeRoots,
    policy: PathPolicy,
}

impl TreeClassifier {
    pub fn new(roots: TreeRoots) -> Self {
        Self {
            roots,
            policy: PathPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PathPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Walk the trees and build the update plan.
    ///
    /// Fails on a missing root or an unreadable file; in that case nothing
    /// has been written.
    pub fn classify(&self) -> Result<UpdatePlan, UpdateError> {
        self.roots.check()?;

        let ancestor = scan(&self.roots.ancestor, &self.policy)?;
        let target = scan(&self.roots.target, &self.policy)?;
        let paths: BTreeSet<&String> = ancestor.keys().chain(target.keys()).collect();

        let mut operations = Vec::new();
        let mut mismatched: Vec<&str> = Vec::new();

        for rel in paths {
            if mismatched.iter().any(|prefix| is_below(rel, prefix)) {
                continue;
            }
            let in_ancestor = ancestor.get(rel).copied();
            let in_target = target.get(rel).copied();
            let in_current = entry_kind(&self.roots.current.join(rel))?;

            let mut kinds = [in_ancestor, in_target, in_current].into_iter().flatten();
            let Some(kind) = kinds.next() else {
                continue;
            };
            if kinds.any(|other| other != kind) {
                mismatched.push(rel);
                operations.push(self.operation(
                    rel,
                    FileAction::Unresolvable(UnresolvableReason::KindMismatch),
                ));
                continue;
            }
            if kind == EntryKind::Dir {
                continue;
            }

            let in_current = in_current.is_some();
            let action = match (in_ancestor, in_target) {
                (Some(_), None) => self.removed_in_target(rel, kind, in_current)?,
                (None, Some(_)) => self.added_in_target(rel, kind, in_current)?,
                (Some(_), Some(_)) => self.present_in_both(rel, kind, in_current)?,
                (None, None) => None,
            };
            if let Some(action) = action {
                operations.push(self.operation(rel, action));
            }
        }

        let plan = UpdatePlan::new(operations);
        info!(
            ancestor = %self.roots.ancestor.display(),
            target = %self.roots.target.display(),
            operations = plan.len(),
            "classified template update"
        );
        Ok(plan)
    }

    fn removed_in_target(
        &self,
        rel: &str,
        kind: EntryKind,
        in_current: bool,
    ) -> Result<Option<FileAction>, UpdateError> {
        if !in_current {
            debug!(path = rel, "removed upstream, already absent");
            return Ok(None);
        }
        let ancestor = Content::load(&self.roots.ancestor.join(rel), kind)?;
        let current = Content::load(&self.roots.current.join(rel), kind)?;
        if current.same(&ancestor) {
            Ok(Some(FileAction::Delete))
        } else {
            Ok(Some(FileAction::Unresolvable(
                UnresolvableReason::ModifiedLocallyDeletedUpstream,
            )))
        }
    }

    fn added_in_target(
        &self,
        rel: &str,
        kind: EntryKind,
        in_current: bool,
    ) -> Result<Option<FileAction>, UpdateError> {
        if !in_current {
            return Ok(Some(FileAction::Copy { new_file: true }));
        }
        let target = Content::load(&self.roots.target.join(rel), kind)?;
        let current = Content::load(&self.roots.current.join(rel), kind)?;
        if current.same(&target) {
            debug!(path = rel, "added upstream, already identical");
            return Ok(None);
        }
        Ok(Some(merge(&current, None, &target)))
    }

    fn present_in_both(
        &self,
        rel: &str,
        kind: EntryKind,
        in_current: bool,
    ) -> Result<Option<FileAction>, UpdateError> {
        let ancestor = Content::load(&self.roots.ancestor.join(rel), kind)?;
        let target = Content::load(&self.roots.target.join(rel), kind)?;
        if ancestor.same(&target) {
            return Ok(None);
        }
        if !in_current {
            return Ok(Some(FileAction::Unresolvable(
                UnresolvableReason::DeletedLocallyModifiedUpstream,
            )));
        }
        let current = Content::load(&self.roots.current.join(rel), kind)?;
        if current.same(&ancestor) {
            return Ok(Some(FileAction::Copy { new_file: false }));
        }
        if current.same(&target) {
            debug!(path = rel, "changed upstream, already identical");
            return Ok(None);
        }
        Ok(Some(merge(&current, Some(&ancestor), &target)))
    }

    fn operation(&self, rel: &str, action: FileAction) -> FileOperation {
        let operation = FileOperation {
            relative_path: rel.to_string(),
            ancestor: self.roots.ancestor.join(rel),
            target: self.roots.target.join(rel),
            current: self.roots.current.join(rel),
            action,
        };
        debug!(code = %operation.code(), path = rel, "classified");
        operation
    }
}

/// Merge the working copy (yours) with the target (theirs). A missing
/// ancestor merges against an empty file. Links that diverge on both sides
/// cannot be merged.
fn merge(current: &Content, ancestor: Option<&Content>, target: &Content) -> FileAction {
    let empty = TextFile::empty();
    let ancestor = match ancestor {
        Some(Content::Text(text)) => Some(text),
        Some(Content::Link(_)) => None,
        None => Some(&empty),
    };
    match (current, ancestor, target) {
        (Content::Text(current), Some(ancestor), Content::Text(target)) => FileAction::Merge {
            result: MergeResolver::merge(current.lines(), ancestor.lines(), target.lines()),
            ending: current.line_ending(),
        },
        _ => FileAction::Unresolvable(UnresolvableReason::SymlinkDiverged),
    }
}

/// Every non-ignored entry below `root`, keyed by forward-slash relative path.
fn scan(root: &Path, policy: &PathPolicy) -> Result<BTreeMap<String, EntryKind>, UpdateError> {
    let mut entries = BTreeMap::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| relative(root, e.path()).map_or(true, |rel| !policy.is_ignored(&rel)));

    for entry in walker {
        let entry = entry?;
        if let Some(rel) = relative(root, entry.path()) {
            entries.insert(rel, EntryKind::of(entry.file_type()));
        }
    }
    debug!(root = %root.display(), entries = entries.len(), "scanned tree");
    Ok(entries)
}

fn relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
    Some(parts.join("/"))
}

fn entry_kind(path: &Path) -> Result<Option<EntryKind>, UpdateError> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) => Ok(Some(EntryKind::of(meta.file_type()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(UpdateError::io(path, e)),
    }
}

fn is_below(path: &str, dir: &str) -> bool {
    path.len() > dir.len() && path.starts_with(dir) && path.as_bytes()[dir.len()] == b'/'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::StatusCode;
    use tempfile::TempDir;

    struct Trees {
        _dir: TempDir,
        roots: TreeRoots,
    }

    impl Trees {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let roots = TreeRoots::new(
                dir.path().join("ancestor"),
                dir.path().join("target"),
                dir.path().join("current"),
            );
            for root in [&roots.ancestor, &roots.target, &roots.current] {
                std::fs::create_dir_all(root).unwrap();
            }
            Self { _dir: dir, roots }
        }

        fn write(&self, root: &Path, rel: &str, content: &str) {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        fn codes(&self) -> Vec<(String, StatusCode)> {
            TreeClassifier::new(self.roots.clone())
                .classify()
                .unwrap()
                .operations()
                .iter()
                .map(|op| (op.relative_path.clone(), op.code()))
                .collect()
        }
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let trees = Trees::new();
        std::fs::remove_dir(&trees.roots.target).unwrap();
        let err = TreeClassifier::new(trees.roots.clone()).classify().unwrap_err();
        assert!(matches!(err, UpdateError::RootNotFound { role: "target", .. }));
    }

    #[test]
    fn test_removed_upstream() {
        let trees = Trees::new();
        let r = &trees.roots;
        trees.write(&r.ancestor, "same.txt", "x\n");
        trees.write(&r.current, "same.txt", "x\r\n");
        trees.write(&r.ancestor, "edited.txt", "x\n");
        trees.write(&r.current, "edited.txt", "y\n");
        trees.write(&r.ancestor, "gone.txt", "x\n");

        assert_eq!(
            trees.codes(),
            vec![
                ("edited.txt".to_string(), StatusCode::Error),
                ("same.txt".to_string(), StatusCode::Deleted),
            ]
        );
    }

    #[test]
    fn test_added_upstream() {
        let trees = Trees::new();
        let r = &trees.roots;
        trees.write(&r.target, "fresh/new.txt", "n\n");
        trees.write(&r.target, "dup.txt", "d\n");
        trees.write(&r.current, "dup.txt", "d");
        trees.write(&r.target, "clash.txt", "theirs\n");
        trees.write(&r.current, "clash.txt", "mine\n");

        assert_eq!(
            trees.codes(),
            vec![
                ("clash.txt".to_string(), StatusCode::Conflict),
                ("fresh/new.txt".to_string(), StatusCode::New),
            ]
        );
    }

    #[test]
    fn test_changed_upstream() {
        let trees = Trees::new();
        let r = &trees.roots;
        trees.write(&r.ancestor, "a.txt", "a\nb\nc\n");
        trees.write(&r.target, "a.txt", "a\nB\nc\n");
        trees.write(&r.current, "a.txt", "a\nb\nC\n");

        trees.write(&r.ancestor, "b.txt", "1\n");
        trees.write(&r.target, "b.txt", "2\n");
        trees.write(&r.current, "b.txt", "1\n");

        trees.write(&r.ancestor, "c.txt", "1\n");
        trees.write(&r.target, "c.txt", "2\n");
        trees.write(&r.current, "c.txt", "2\n");

        trees.write(&r.ancestor, "d.txt", "1\n");
        trees.write(&r.target, "d.txt", "2\n");

        trees.write(&r.ancestor, "e.txt", "same\n");
        trees.write(&r.target, "e.txt", "same\n");
        trees.write(&r.current, "e.txt", "local\n");

        assert_eq!(
            trees.codes(),
            vec![
                ("a.txt".to_string(), StatusCode::Merged),
                ("b.txt".to_string(), StatusCode::Modified),
                ("d.txt".to_string(), StatusCode::Error),
            ]
        );
    }

    #[test]
    fn test_kind_mismatch_reported_once() {
        let trees = Trees::new();
        let r = &trees.roots;
        trees.write(&r.ancestor, "thing", "file\n");
        trees.write(&r.target, "thing/inner.txt", "now a dir\n");
        trees.write(&r.current, "thing", "file\n");

        let plan = TreeClassifier::new(r.clone()).classify().unwrap();
        assert_eq!(plan.len(), 1);
        let op = &plan.operations()[0];
        assert_eq!(op.relative_path, "thing");
        assert_eq!(
            op.action,
            FileAction::Unresolvable(UnresolvableReason::KindMismatch)
        );
    }

    #[test]
    fn test_new_file_under_local_file_is_mismatch() {
        let trees = Trees::new();
        let r = &trees.roots;
        trees.write(&r.target, "conf/app.toml", "x\n");
        trees.write(&r.current, "conf", "local file\n");

        assert_eq!(
            trees.codes(),
            vec![("conf".to_string(), StatusCode::Error)]
        );
    }

    #[test]
    fn test_current_only_paths_untouched() {
        let trees = Trees::new();
        trees.write(&trees.roots.current, "mine.txt", "local\n");
        assert!(trees.codes().is_empty());
    }

    #[test]
    fn test_policy_skips_ignored_paths() {
        let trees = Trees::new();
        let r = &trees.roots;
        trees.write(&r.target, "docs/readme.md", "docs\n");
        trees.write(&r.target, "src/app.py", "app\n");

        let plan = TreeClassifier::new(r.clone())
            .with_policy(PathPolicy::new(vec!["docs".into()]))
            .classify()
            .unwrap();
        let paths: Vec<_> = plan.operations().iter().map(|o| o.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["src/app.py"]);
    }

    #[test]
    fn test_merge_keeps_crlf_of_working_copy() {
        let trees = Trees::new();
        let r = &trees.roots;
        trees.write(&r.ancestor, "w.txt", "a\nb\nc\n");
        trees.write(&r.target, "w.txt", "a\nB\nc\n");
        trees.write(&r.current, "w.txt", "a\r\nb\r\nC\r\n");

        let plan = TreeClassifier::new(r.clone()).classify().unwrap();
        match &plan.operations()[0].action {
            FileAction::Merge { result, ending } => {
                assert_eq!(result.lines, vec!["a", "B", "C"]);
                assert_eq!(*ending, crate::text::LineEnding::CrLf);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[cfg(unix)]
    fn link(root: &Path, rel: &str, destination: &str) {
        std::os::unix::fs::symlink(destination, root.join(rel)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unchanged_directory_symlink_is_left_alone() {
        let trees = Trees::new();
        let r = &trees.roots;
        for root in [&r.ancestor, &r.target, &r.current] {
            trees.write(root, "real/x.txt", "one\n");
            link(root, "link", "real");
        }
        trees.write(&r.target, "real/x.txt", "two\n");

        assert_eq!(
            trees.codes(),
            vec![("real/x.txt".to_string(), StatusCode::Modified)]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_compared_by_destination() {
        let trees = Trees::new();
        let r = &trees.roots;
        for root in [&r.ancestor, &r.target, &r.current] {
            trees.write(root, "a.txt", "a\n");
            trees.write(root, "b.txt", "b\n");
        }
        // retargeted upstream only
        link(&r.ancestor, "moved", "a.txt");
        link(&r.target, "moved", "b.txt");
        link(&r.current, "moved", "a.txt");
        // retargeted on both sides
        link(&r.ancestor, "both", "a.txt");
        link(&r.target, "both", "b.txt");
        link(&r.current, "both", "elsewhere");
        // new upstream
        link(&r.target, "fresh", "a.txt");
        // a regular file locally
        link(&r.ancestor, "kind", "a.txt");
        link(&r.target, "kind", "b.txt");
        trees.write(&r.current, "kind", "a\n");

        let plan = TreeClassifier::new(r.clone()).classify().unwrap();
        let summary: Vec<_> = plan
            .operations()
            .iter()
            .map(|o| (o.relative_path.as_str(), o.action.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    "both",
                    FileAction::Unresolvable(UnresolvableReason::SymlinkDiverged)
                ),
                ("fresh", FileAction::Copy { new_file: true }),
                (
                    "kind",
                    FileAction::Unresolvable(UnresolvableReason::KindMismatch)
                ),
                ("moved", FileAction::Copy { new_file: false }),
            ]
        );

        let report = plan.apply();
        assert!(report.is_success());
        assert_eq!(std::fs::read_link(r.current.join("moved")).unwrap(), PathBuf::from("b.txt"));
        assert_eq!(std::fs::read_link(r.current.join("fresh")).unwrap(), PathBuf::from("a.txt"));
        assert_eq!(
            std::fs::read_link(r.current.join("both")).unwrap(),
            PathBuf::from("elsewhere")
        );
    }

    #[test]
    fn test_is_below() {
        assert!(is_below("a/b", "a"));
        assert!(!is_below("ab", "a"));
        assert!(!is_below("a", "a"));
    }
}
