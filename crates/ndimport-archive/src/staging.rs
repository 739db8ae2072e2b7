use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ndimport_fs::StagingArea;

use crate::entry::ArchiveReport;
use crate::error::{Error, Result};
use crate::extract::{EntrySource, ZipSource, extract};
use crate::options::ExtractOptions;

/// Archive content extracted into a staging area owned by this value.
///
/// Dropping it removes the staging directory unless it was marked kept.
pub struct StagedArchive {
    staging: StagingArea,
    report: ArchiveReport,
}

impl StagedArchive {
    pub fn path(&self) -> &Path {
        self.staging.path()
    }

    pub fn report(&self) -> &ArchiveReport {
        &self.report
    }

    pub fn entry_count(&self) -> usize {
        self.report.entry_count
    }
}

/// Open the ZIP archive at `archive` and extract it into a fresh staging
/// directory created under `staging_base` (system temp when `None`).
///
/// The archive is parsed and checked for entries before the staging
/// directory exists. Any later failure drops the staging area with whatever
/// was written so far.
pub fn extract_to_staging(
    archive: &Path,
    staging_base: Option<&Path>,
    options: &ExtractOptions,
) -> Result<StagedArchive> {
    let file = File::open(archive).map_err(|e| Error::Open {
        path: archive.to_path_buf(),
        source: e,
    })?;
    let mut source = ZipSource::new(BufReader::new(file))?;
    if source.is_empty() {
        return Err(Error::EmptyArchive {
            path: archive.to_path_buf(),
        });
    }

    let mut staging = StagingArea::create(staging_base, &options.staging_prefix)?;
    staging.keep(options.keep_staging);

    let report = extract(&mut source, staging.path(), options)?;
    tracing::info!(
        entries = report.entry_count,
        staging = %staging.path().display(),
        "extracted {} entries",
        report.entry_count
    );

    Ok(StagedArchive { staging, report })
}
