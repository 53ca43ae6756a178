//! Per-path update operations and their execution.
//!
//! A [`FileOperation`] is fully decided at classification time; [`FileOperation::perform`]
//! is the only code in the crate that writes to the working tree.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::diff::MergeResult;
use crate::errors::ApplyError;
use crate::text::{render_lines, LineEnding};

/// Why a path cannot be updated automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvableReason {
    /// Upstream deleted the file but the working copy has local edits.
    ModifiedLocallyDeletedUpstream,
    /// Upstream changed the file but the working copy deleted it.
    DeletedLocallyModifiedUpstream,
    /// The path is a file, a directory or a symlink depending on the tree.
    KindMismatch,
    /// A symlink points somewhere new both locally and upstream.
    SymlinkDiverged,
}

impl fmt::Display for UnresolvableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ModifiedLocallyDeletedUpstream => "modified locally, deleted upstream",
            Self::DeletedLocallyModifiedUpstream => "deleted locally, modified upstream",
            Self::KindMismatch => "different kinds of entry at the same path",
            Self::SymlinkDiverged => "symlink retargeted locally and upstream",
        };
        f.write_str(text)
    }
}

/// What [`FileOperation::perform`] will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    /// Copy the target's bytes over the working copy, or recreate the
    /// target's symlink. `new_file` is set when the working copy lacked the
    /// path.
    Copy { new_file: bool },
    /// Remove the path from the working copy, along with any parent
    /// directories this empties that the target no longer has.
    Delete,
    /// Overwrite the working copy with merged lines, markers included.
    Merge {
        result: MergeResult,
        ending: LineEnding,
    },
    /// Leave the working copy alone and report the path.
    Unresolvable(UnresolvableReason),
}

/// Short reporting code of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusCode {
    New,
    Deleted,
    Modified,
    Merged,
    Conflict,
    Error,
}

impl StatusCode {
    pub const ALL: [StatusCode; 6] = [
        Self::New,
        Self::Deleted,
        Self::Modified,
        Self::Merged,
        Self::Conflict,
        Self::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Deleted => "DEL",
            Self::Modified => "MOD",
            Self::Merged => "MGD",
            Self::Conflict => "CFL",
            Self::Error => "ERR",
        }
    }

    /// Whether the path needs manual attention after the update.
    pub fn needs_attention(self) -> bool {
        matches!(self, Self::Conflict | Self::Error)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified path and the action to take on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOperation {
    /// Forward-slash path relative to the tree roots.
    pub relative_path: String,
    pub ancestor: PathBuf,
    pub target: PathBuf,
    pub current: PathBuf,
    pub action: FileAction,
}

impl FileOperation {
    pub fn code(&self) -> StatusCode {
        match &self.action {
            FileAction::Copy { new_file: true } => StatusCode::New,
            FileAction::Copy { new_file: false } => StatusCode::Modified,
            FileAction::Delete => StatusCode::Deleted,
            FileAction::Merge { result, .. } if result.has_conflicts() => StatusCode::Conflict,
            FileAction::Merge { .. } => StatusCode::Merged,
            FileAction::Unresolvable(_) => StatusCode::Error,
        }
    }

    /// `[CODE] path`, plus the reason for unresolvable paths.
    pub fn message(&self) -> String {
        match &self.action {
            FileAction::Unresolvable(reason) => {
                format!("[{}] {} ({})", self.code(), self.relative_path, reason)
            }
            FileAction::Merge { result, .. } if result.has_conflicts() => format!(
                "[{}] {} ({} conflict{})",
                self.code(),
                self.relative_path,
                result.conflict_count,
                if result.conflict_count == 1 { "" } else { "s" }
            ),
            _ => format!("[{}] {}", self.code(), self.relative_path),
        }
    }

    /// Apply this operation to the working copy.
    ///
    /// Conflicted merges are written with their markers. Unresolvable paths
    /// are left untouched.
    pub fn perform(&self) -> Result<(), ApplyError> {
        match &self.action {
            FileAction::Copy { .. } => {
                if let Some(parent) = self.current.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| ApplyError::io(parent, e))?;
                }
                let meta = std::fs::symlink_metadata(&self.target)
                    .map_err(|e| ApplyError::io(&self.target, e))?;
                if meta.file_type().is_symlink() {
                    self.copy_link()?;
                } else {
                    std::fs::copy(&self.target, &self.current)
                        .map_err(|e| ApplyError::io(&self.current, e))?;
                }
            }
            FileAction::Delete => {
                std::fs::remove_file(&self.current).map_err(|e| ApplyError::io(&self.current, e))?;
                self.prune_empty_parents();
            }
            FileAction::Merge { result, ending } => {
                std::fs::write(&self.current, render_lines(&result.lines, *ending))
                    .map_err(|e| ApplyError::io(&self.current, e))?;
            }
            FileAction::Unresolvable(reason) => {
                debug!(path = %self.relative_path, %reason, "leaving unresolvable path untouched");
                return Ok(());
            }
        }
        info!(code = %self.code(), path = %self.relative_path, "applied");
        Ok(())
    }

    fn copy_link(&self) -> Result<(), ApplyError> {
        let destination =
            std::fs::read_link(&self.target).map_err(|e| ApplyError::io(&self.target, e))?;
        if std::fs::symlink_metadata(&self.current).is_ok() {
            std::fs::remove_file(&self.current).map_err(|e| ApplyError::io(&self.current, e))?;
        }
        create_link(&destination, &self.current).map_err(|e| ApplyError::io(&self.current, e))
    }

    /// Remove directories above a deleted path while they are empty and
    /// absent from the target. Stops at the working copy root.
    fn prune_empty_parents(&self) {
        let depth = self.relative_path.split('/').count();
        let mut current = self.current.parent();
        let mut target = self.target.parent();
        for _ in 1..depth {
            let (Some(dir), Some(upstream)) = (current, target) else {
                break;
            };
            if upstream.is_dir() || std::fs::remove_dir(dir).is_err() {
                break;
            }
            debug!(dir = %dir.display(), "removed emptied directory");
            current = dir.parent();
            target = upstream.parent();
        }
    }
}

#[cfg(unix)]
fn create_link(destination: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(destination, link)
}

#[cfg(windows)]
fn create_link(destination: &Path, link: &Path) -> std::io::Result<()> {
    let resolved = link.parent().map(|dir| dir.join(destination));
    if resolved.is_some_and(|p| p.is_dir()) {
        std::os::windows::fs::symlink_dir(destination, link)
    } else {
        std::os::windows::fs::symlink_file(destination, link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn op(dir: &TempDir, rel: &str, action: FileAction) -> FileOperation {
        FileOperation {
            relative_path: rel.to_string(),
            ancestor: dir.path().join("ancestor").join(rel),
            target: dir.path().join("target").join(rel),
            current: dir.path().join("current").join(rel),
            action,
        }
    }

    fn merged(lines: &[&str], conflict_count: usize) -> FileAction {
        FileAction::Merge {
            result: MergeResult {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                conflict_count,
            },
            ending: LineEnding::Lf,
        }
    }

    #[test]
    fn test_codes() {
        let dir = TempDir::new().unwrap();
        let cases = [
            (FileAction::Copy { new_file: true }, "NEW"),
            (FileAction::Copy { new_file: false }, "MOD"),
            (FileAction::Delete, "DEL"),
            (merged(&["a"], 0), "MGD"),
            (merged(&["a"], 2), "CFL"),
            (FileAction::Unresolvable(UnresolvableReason::KindMismatch), "ERR"),
        ];
        for (action, code) in cases {
            assert_eq!(op(&dir, "f.txt", action).code().as_str(), code);
        }
    }

    #[test]
    fn test_message_format() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            op(&dir, "src/a.py", FileAction::Delete).message(),
            "[DEL] src/a.py"
        );
        assert_eq!(
            op(&dir, "b.py", merged(&[], 1)).message(),
            "[CFL] b.py (1 conflict)"
        );
        let msg = op(
            &dir,
            "c.py",
            FileAction::Unresolvable(UnresolvableReason::ModifiedLocallyDeletedUpstream),
        )
        .message();
        assert_eq!(msg, "[ERR] c.py (modified locally, deleted upstream)");
    }

    #[test]
    fn test_perform_copy_creates_parents() {
        let dir = TempDir::new().unwrap();
        let operation = op(&dir, "deep/nested/new.txt", FileAction::Copy { new_file: true });
        std::fs::create_dir_all(operation.target.parent().unwrap()).unwrap();
        std::fs::write(&operation.target, b"fresh\r\n").unwrap();

        operation.perform().unwrap();
        assert_eq!(std::fs::read(&operation.current).unwrap(), b"fresh\r\n");
    }

    #[test]
    fn test_perform_delete_and_missing_file_error() {
        let dir = TempDir::new().unwrap();
        let operation = op(&dir, "gone.txt", FileAction::Delete);
        std::fs::create_dir_all(operation.current.parent().unwrap()).unwrap();
        std::fs::write(&operation.current, "x\n").unwrap();

        operation.perform().unwrap();
        assert!(!operation.current.exists());

        let err = operation.perform().unwrap_err();
        assert!(matches!(err, ApplyError::Io { .. }));
    }

    #[test]
    fn test_perform_merge_writes_markers() {
        let dir = TempDir::new().unwrap();
        let operation = op(&dir, "m.txt", merged(&["a", "<<<<<<<", "y", "=======", "t", ">>>>>>>"], 1));
        std::fs::create_dir_all(operation.current.parent().unwrap()).unwrap();
        std::fs::write(&operation.current, "old\n").unwrap();

        operation.perform().unwrap();
        let written = std::fs::read_to_string(&operation.current).unwrap();
        assert_eq!(written, "a\n<<<<<<<\ny\n=======\nt\n>>>>>>>\n");
    }

    #[test]
    fn test_perform_unresolvable_is_noop() {
        let dir = TempDir::new().unwrap();
        let operation = op(
            &dir,
            "kept.txt",
            FileAction::Unresolvable(UnresolvableReason::ModifiedLocallyDeletedUpstream),
        );
        operation.perform().unwrap();
        assert!(!operation.current.exists());
    }

    #[test]
    fn test_delete_prunes_directories_gone_upstream() {
        let dir = TempDir::new().unwrap();
        let operation = op(&dir, "old/nested/last.txt", FileAction::Delete);
        std::fs::create_dir_all(operation.current.parent().unwrap()).unwrap();
        std::fs::write(&operation.current, "x\n").unwrap();
        std::fs::create_dir_all(dir.path().join("target")).unwrap();

        operation.perform().unwrap();
        assert!(!dir.path().join("current/old").exists());
        assert!(dir.path().join("current").is_dir());
    }

    #[test]
    fn test_delete_keeps_non_empty_and_upstream_directories() {
        let dir = TempDir::new().unwrap();
        let operation = op(&dir, "kept/sub/gone.txt", FileAction::Delete);
        std::fs::create_dir_all(operation.current.parent().unwrap()).unwrap();
        std::fs::write(&operation.current, "x\n").unwrap();
        std::fs::write(dir.path().join("current/kept/local.txt"), "mine\n").unwrap();

        let upstream = op(&dir, "still/here.txt", FileAction::Delete);
        std::fs::create_dir_all(upstream.current.parent().unwrap()).unwrap();
        std::fs::create_dir_all(upstream.target.parent().unwrap()).unwrap();
        std::fs::write(&upstream.current, "x\n").unwrap();

        operation.perform().unwrap();
        upstream.perform().unwrap();
        assert!(!dir.path().join("current/kept/sub").exists());
        assert!(dir.path().join("current/kept/local.txt").exists());
        assert!(dir.path().join("current/still").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_perform_copy_recreates_symlink() {
        let dir = TempDir::new().unwrap();
        let operation = op(&dir, "link", FileAction::Copy { new_file: false });
        for root in ["target", "current"] {
            std::fs::create_dir_all(dir.path().join(root)).unwrap();
        }
        std::os::unix::fs::symlink("real", &operation.target).unwrap();
        std::os::unix::fs::symlink("old", &operation.current).unwrap();

        operation.perform().unwrap();
        assert_eq!(std::fs::read_link(&operation.current).unwrap(), PathBuf::from("real"));
    }

    #[test]
    fn test_needs_attention() {
        assert!(StatusCode::Conflict.needs_attention());
        assert!(StatusCode::Error.needs_attention());
        assert!(!StatusCode::Merged.needs_attention());
    }
}
