use std::io::{Read, Seek};

use ::zip::ZipArchive;

use crate::entry::EntryKind;
use crate::error::Result;
use crate::extract::{EntrySource, PendingEntry};

pub struct ZipSource<R: Read + Seek> {
    archive: ZipArchive<R>,
    index: usize,
}

impl<R: Read + Seek> ZipSource<R> {
    /// Parse the central directory. Fails with [`crate::Error::Corrupted`]
    /// when the reader does not hold a ZIP archive.
    pub fn new(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { archive, index: 0 })
    }
}

impl<R: Read + Seek> EntrySource for ZipSource<R> {
    fn len(&self) -> usize {
        self.archive.len()
    }

    fn next_entry(&mut self) -> Option<Result<PendingEntry<'_>>> {
        if self.index >= self.archive.len() {
            return None;
        }
        let index = self.index;
        self.index += 1;

        let file = match self.archive.by_index(index) {
            Ok(file) => file,
            Err(e) => return Some(Err(e.into())),
        };

        let name = file.name().to_string();
        let size = file.size();
        let mode = file.unix_mode();

        let pending = if file.is_dir() {
            PendingEntry {
                name,
                kind: EntryKind::Directory,
                mode,
                size: 0,
                reader: None,
            }
        } else {
            // content is decompressed lazily while it is copied to disk
            PendingEntry {
                name,
                kind: EntryKind::File,
                mode,
                size,
                reader: Some(Box::new(file)),
            }
        };
        Some(Ok(pending))
    }
}
