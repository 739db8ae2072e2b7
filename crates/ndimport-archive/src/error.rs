use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid label '{label}': {reason}")]
    InvalidLabel { label: String, reason: &'static str },

    #[error("failed to open archive '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("archive is corrupted: {0}")]
    Corrupted(#[from] zip::result::ZipError),

    #[error("archive '{path}' is empty")]
    EmptyArchive { path: PathBuf },

    #[error("zip-slip attack detected: entry '{entry}' resolves to '{cleaned}'")]
    UnsafePath { entry: String, cleaned: PathBuf },

    #[error("failed to extract '{path}': {source}")]
    ExtractionFailed { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Fs(#[from] ndimport_fs::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
