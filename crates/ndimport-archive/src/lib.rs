//! Archive extraction with path sanitization and isolated staging.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Label sanitization and entry path cleaning (zip-slip prevention)
//! - `extract.rs` - Entry sources and the streaming extraction loop
//! - `staging.rs` - Extraction into a run-owned staging directory
//! - `entry.rs` - Entry records and the extraction report

pub use entry::{ArchiveEntry, ArchiveReport, EntryKind};
pub use error::{Error, Result};
pub use extract::{EntrySource, PendingEntry, ZipSource, extract, extract_from_reader};
pub use options::ExtractOptions;
pub use sanitize::{SafeSegment, clean_entry_path, sanitize_label};
pub use staging::{StagedArchive, extract_to_staging};

pub mod entry;
mod error;
pub mod extract;
pub mod options;
mod sanitize;
mod staging;
