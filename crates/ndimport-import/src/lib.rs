//! Import pipeline: extract an archive into staging, prune it, merge it into
//! the library without overwriting anything.
//!
//! - `prune.rs` - glob-based removal with the keep-something guard
//! - `merge.rs` - two-phase collision check and copy
//! - `pipeline.rs` - step sequencing and staging lifetime
//! - `report.rs` - run counters and summary

pub mod error;
pub mod merge;
pub mod pipeline;
pub mod prune;
pub mod report;

pub use error::{ErrorKind, ImportError, Result};
pub use merge::{CollisionKind, MergePlan, MergeReport, merge, merge_excluding};
pub use pipeline::{ImportPipeline, ImportRequest, Stage};
pub use prune::{PrunePatterns, PrunePlan, PruneReport, prune};
pub use report::{ImportReport, RunStats, human_bytes};
