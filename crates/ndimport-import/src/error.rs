//! Error types for ndimport-import.

use std::path::PathBuf;
use thiserror::Error;

use crate::merge::CollisionKind;

/// Coarse classification callers use for exit codes and messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Archive,
    UnsafePath,
    PruneWouldRemoveEverything,
    Collision,
    Io,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid prune pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },

    #[error(transparent)]
    Archive(#[from] ndimport_archive::Error),

    #[error("prune patterns would remove all {files} files; aborting")]
    PruneWouldRemoveEverything { files: usize },

    #[error("destination conflict: {path} {kind}")]
    Collision { path: PathBuf, kind: CollisionKind },

    #[error(
        "merge into '{destination}' failed after copying {copied} file(s); destination may be partially modified: {source}"
    )]
    PartialMerge {
        destination: PathBuf,
        copied: usize,
        source: ndimport_fs::Error,
    },

    #[error("failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error(transparent)]
    Fs(#[from] ndimport_fs::Error),
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        use ndimport_archive::Error as ArchiveError;

        match self {
            Self::InvalidInput(_) | Self::InvalidPattern { .. } => ErrorKind::InvalidInput,
            Self::Archive(e) => match e {
                ArchiveError::InvalidLabel { .. } => ErrorKind::InvalidInput,
                ArchiveError::UnsafePath { .. } => ErrorKind::UnsafePath,
                ArchiveError::Open { .. }
                | ArchiveError::Corrupted(_)
                | ArchiveError::EmptyArchive { .. } => ErrorKind::Archive,
                ArchiveError::ExtractionFailed { .. } | ArchiveError::Fs(_) => ErrorKind::Io,
            },
            Self::PruneWouldRemoveEverything { .. } => ErrorKind::PruneWouldRemoveEverything,
            Self::Collision { .. } => ErrorKind::Collision,
            Self::PartialMerge { .. } | Self::Walk { .. } | Self::Fs(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;
