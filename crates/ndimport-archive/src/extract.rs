//! Streaming extraction of archive entries into a directory.
//!
//! Each entry's name is cleaned and checked before anything touches the
//! filesystem; an unsafe name aborts the whole extraction. File content is
//! copied entry by entry, never buffered for the whole archive.

use std::io::{Read, Seek};
use std::path::Path;

use ndimport_fs::permissions;

use crate::entry::{ArchiveEntry, ArchiveReport, EntryKind};
use crate::error::{Error, Result};
use crate::options::ExtractOptions;
use crate::sanitize::clean_entry_path;

mod zip;

pub use self::zip::ZipSource;

/// An entry read from the archive whose content has not been written yet.
pub struct PendingEntry<'a> {
    pub name: String,
    pub kind: EntryKind,
    pub mode: Option<u32>,
    pub size: u64,
    /// Content stream; `None` for directories.
    pub reader: Option<Box<dyn Read + 'a>>,
}

/// Archive-specific entry source.
pub trait EntrySource {
    /// Number of entries the archive declares.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next entry, borrowing the source until the entry is dropped.
    fn next_entry(&mut self) -> Option<Result<PendingEntry<'_>>>;
}

/// Write every entry of `source` below `destination`.
pub fn extract<S: EntrySource + ?Sized>(
    source: &mut S,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<ArchiveReport> {
    let mut report = ArchiveReport::default();

    while let Some(pending) = source.next_entry() {
        let pending = pending?;
        report.entry_count += 1;

        let Some(relative) = clean_entry_path(&pending.name)? else {
            tracing::debug!(entry = %pending.name, "skipping root entry");
            continue;
        };
        let target = destination.join(&relative);

        let size = match pending.kind {
            EntryKind::Directory => {
                permissions::create_dir_all(&target, options.dir_mode)?;
                0
            }
            EntryKind::File => write_file(pending.reader, &target, options.file_mode(pending.mode), options)?,
        };

        tracing::debug!(entry = %relative.display(), size, "extracted");
        report.total_bytes += size;
        report.entries.push(ArchiveEntry {
            original_name: pending.name,
            path: relative,
            kind: pending.kind,
            mode: pending.mode.map(permissions::permission_bits),
            size,
        });
    }

    Ok(report)
}

fn write_file(
    reader: Option<Box<dyn Read + '_>>,
    target: &Path,
    mode: u32,
    options: &ExtractOptions,
) -> Result<u64> {
    if let Some(parent) = target.parent() {
        permissions::create_dir_all(parent, options.dir_mode)?;
    }

    let mut file = permissions::create_file(target, mode)?;
    let Some(mut reader) = reader else {
        return Ok(0);
    };

    std::io::copy(&mut reader, &mut file).map_err(|e| Error::ExtractionFailed {
        path: target.to_path_buf(),
        source: e,
    })
}

/// Extract a ZIP archive from `reader` into `destination`.
pub fn extract_from_reader<R: Read + Seek>(
    reader: R,
    destination: &Path,
    options: &ExtractOptions,
) -> Result<ArchiveReport> {
    let mut source = ZipSource::new(reader)?;
    extract(&mut source, destination, options)
}
