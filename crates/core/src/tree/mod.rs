//! Directory-tree update: classification, plans, and application.
//!
//! [`TreeClassifier::classify`] walks the ancestor, target, and working-copy
//! trees and returns an [`UpdatePlan`]. The plan is pure data until
//! [`UpdatePlan::apply`] runs each operation.

pub mod classifier;
pub mod operation;
pub mod policy;

use std::collections::BTreeMap;

use tracing::{info, warn};

pub use classifier::{TreeClassifier, TreeRoots};
pub use operation::{FileAction, FileOperation, StatusCode, UnresolvableReason};
pub use policy::PathPolicy;

use crate::errors::ApplyError;

/// Ordered operations produced by one classification run.
#[derive(Debug, Clone, Default)]
pub struct UpdatePlan {
    operations: Vec<FileOperation>,
}

impl UpdatePlan {
    /// Operations are kept sorted by relative path.
    pub fn new(mut operations: Vec<FileOperation>) -> Self {
        operations.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Self { operations }
    }

    pub fn operations(&self) -> &[FileOperation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// `true` when the working copy is already up to date.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of operations per status code; codes with no operation are omitted.
    pub fn summary(&self) -> BTreeMap<StatusCode, usize> {
        let mut counts = BTreeMap::new();
        for op in &self.operations {
            *counts.entry(op.code()).or_insert(0) += 1;
        }
        counts
    }

    /// Paths left with conflict markers or not updated at all.
    pub fn conflicted_paths(&self) -> Vec<&str> {
        self.operations
            .iter()
            .filter(|op| op.code().needs_attention())
            .map(|op| op.relative_path.as_str())
            .collect()
    }

    /// Perform every operation. A failing path is recorded and the remaining
    /// operations still run.
    pub fn apply(&self) -> ApplyReport {
        let mut report = ApplyReport::default();
        for op in &self.operations {
            match op.perform() {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    warn!(path = %op.relative_path, error = %e, "operation failed");
                    report.failed.push((op.relative_path.clone(), e));
                }
            }
        }
        info!(
            applied = report.applied,
            failed = report.failed.len(),
            "update applied"
        );
        report
    }
}

/// Outcome of [`UpdatePlan::apply`].
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub applied: usize,
    pub failed: Vec<(String, ApplyError)>,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::MergeResult;
    use crate::text::LineEnding;
    use tempfile::TempDir;

    fn op(dir: &TempDir, rel: &str, action: FileAction) -> FileOperation {
        FileOperation {
            relative_path: rel.to_string(),
            ancestor: dir.path().join("a").join(rel),
            target: dir.path().join("t").join(rel),
            current: dir.path().join("c").join(rel),
            action,
        }
    }

    #[test]
    fn test_plan_sorted_and_summarized() {
        let dir = TempDir::new().unwrap();
        let plan = UpdatePlan::new(vec![
            op(&dir, "z.txt", FileAction::Delete),
            op(&dir, "a.txt", FileAction::Copy { new_file: true }),
            op(
                &dir,
                "m.txt",
                FileAction::Merge {
                    result: MergeResult {
                        lines: vec![],
                        conflict_count: 1,
                    },
                    ending: LineEnding::Lf,
                },
            ),
            op(
                &dir,
                "e.txt",
                FileAction::Unresolvable(UnresolvableReason::DeletedLocallyModifiedUpstream),
            ),
        ]);

        let paths: Vec<_> = plan.operations().iter().map(|o| o.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "e.txt", "m.txt", "z.txt"]);

        let summary = plan.summary();
        assert_eq!(summary.get(&StatusCode::New), Some(&1));
        assert_eq!(summary.get(&StatusCode::Deleted), Some(&1));
        assert_eq!(summary.get(&StatusCode::Modified), None);
        assert_eq!(plan.conflicted_paths(), vec!["e.txt", "m.txt"]);
    }

    #[test]
    fn test_empty_plan() {
        let plan = UpdatePlan::default();
        assert!(plan.is_empty());
        assert!(plan.summary().is_empty());
        assert!(plan.apply().is_success());
    }

    #[test]
    fn test_apply_continues_after_failure() {
        let dir = TempDir::new().unwrap();
        let missing = op(&dir, "missing.txt", FileAction::Delete);
        let copy = op(&dir, "ok.txt", FileAction::Copy { new_file: true });
        std::fs::create_dir_all(copy.target.parent().unwrap()).unwrap();
        std::fs::write(&copy.target, "ok\n").unwrap();

        let report = UpdatePlan::new(vec![missing, copy.clone()]).apply();
        assert_eq!(report.applied, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "missing.txt");
        assert!(!report.is_success());
        assert!(copy.current.exists());
    }
}
