//! templsync core library.
//!
//! Brings a project generated from a versioned template up to a newer
//! template release without discarding local edits: a line-based three-way
//! merge engine, a classifier that decides per file how to update the working
//! copy, and the collaborators that fetch template releases.

pub mod config;
pub mod diff;
pub mod errors;
pub mod release;
pub mod text;
pub mod tree;

// Re-exports for convenience.
pub use config::TemplateConfig;
pub use diff::{Diff3Engine, LineDiff, MergeResolver, MergeResult};
pub use errors::CoreError;
pub use release::{ReleaseCache, Tag, TagClient};
pub use tree::{ApplyReport, FileOperation, StatusCode, TreeClassifier, TreeRoots, UpdatePlan};
