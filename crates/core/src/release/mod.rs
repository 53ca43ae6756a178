//! Template releases: remote tag listing and local materialization.
//!
//! Everything here runs before classification starts, so a failed fetch or
//! checkout never touches the working copy.

pub mod cache;
pub mod remote_url;
pub mod tags;

pub use cache::ReleaseCache;
pub use tags::{find_version, latest, Tag, TagClient};
