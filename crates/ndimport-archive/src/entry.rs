use std::path::PathBuf;

/// An archive entry after its path has been validated and written to staging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Name as declared by the archive.
    pub original_name: String,
    /// Cleaned path relative to the staging root.
    pub path: PathBuf,
    pub kind: EntryKind,
    /// Permission bits declared by the archive, if any.
    pub mode: Option<u32>,
    pub size: u64,
}

impl ArchiveEntry {
    pub fn is_file(&self) -> bool {
        matches!(self.kind, EntryKind::File)
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Clone, Debug, Default)]
pub struct ArchiveReport {
    /// Every entry the archive declared, including ones that cleaned to the root.
    pub entry_count: usize,
    pub total_bytes: u64,
    pub entries: Vec<ArchiveEntry>,
}

impl ArchiveReport {
    pub fn files(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter().filter(|e| e.is_file())
    }
}
