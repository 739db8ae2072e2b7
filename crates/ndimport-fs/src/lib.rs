//! Filesystem primitives shared by the nd-import pipeline.
//!
//! - `staging.rs` - run-scoped temporary directories with drop cleanup
//! - `permissions.rs` - mode-aware directory and file creation
//! - `copy.rs` - file copy and recursive removal

mod copy;
mod error;
pub mod permissions;
mod staging;

pub use copy::{copy_file, remove_all};
pub use error::{Error, Result};
pub use permissions::{DEFAULT_FILE_MODE, DIR_MODE};
pub use staging::StagingArea;
