//! Pipeline - extract, prune and merge one archive into the library.
//!
//! The pipeline owns the staging directory for the length of a run and
//! drops it on every exit path. Steps run strictly in order; the first
//! failure ends the run and is returned unchanged.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use ndimport_archive::{ExtractOptions, SafeSegment, extract_to_staging, sanitize_label};

use crate::error::{ImportError, Result};
use crate::merge::merge_excluding;
use crate::prune::{PrunePatterns, prune};
use crate::report::{ImportReport, RunStats};

/// Progress of a run through the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Start,
    Validated,
    Extracted,
    Pruned,
    Merged,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Validated => "validated",
            Self::Extracted => "extracted",
            Self::Pruned => "pruned",
            Self::Merged => "merged",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// One archive to import.
#[derive(Clone, Debug)]
pub struct ImportRequest {
    /// Free-form label (artist name) naming the destination folder.
    pub label: String,
    /// Local archive, already downloaded.
    pub archive: PathBuf,
    pub downloaded_bytes: Option<u64>,
}

impl ImportRequest {
    pub fn new(label: impl Into<String>, archive: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            archive: archive.into(),
            downloaded_bytes: None,
        }
    }

    pub fn downloaded_bytes(mut self, bytes: u64) -> Self {
        self.downloaded_bytes = Some(bytes);
        self
    }
}

/// Composable builder for the options shared by every run.
#[derive(Clone, Debug)]
pub struct ImportPipeline {
    library_root: PathBuf,
    patterns: PrunePatterns,
    keep_temp: bool,
    dry_run: bool,
    tmp_dir: Option<PathBuf>,
}

impl ImportPipeline {
    pub fn new(library_root: impl Into<PathBuf>) -> Self {
        Self {
            library_root: library_root.into(),
            patterns: PrunePatterns::default(),
            keep_temp: false,
            dry_run: false,
            tmp_dir: None,
        }
    }

    pub fn patterns(mut self, patterns: PrunePatterns) -> Self {
        self.patterns = patterns;
        self
    }

    /// Leave staging directories on disk after the run.
    pub fn keep_temp(mut self, keep: bool) -> Self {
        self.keep_temp = keep;
        self
    }

    /// Plan pruning and merging without modifying the destination.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Directory under which staging directories are created.
    pub fn tmp_dir(mut self, tmp_dir: Option<PathBuf>) -> Self {
        self.tmp_dir = tmp_dir;
        self
    }

    /// Base directory for staging, `None` meaning the system temp dir.
    pub fn staging_base(&self) -> Option<&Path> {
        self.tmp_dir.as_deref()
    }

    /// Execute the pipeline for one archive.
    pub fn run(&self, request: &ImportRequest) -> Result<ImportReport> {
        let mut stage = Stage::Start;
        let result = self.execute(request, &mut stage);
        if let Err(e) = &result {
            tracing::warn!(stage = %stage, kind = ?e.kind(), "import failed after stage {stage}");
            advance(&mut stage, Stage::Failed);
        }
        result
    }

    fn execute(&self, request: &ImportRequest, stage: &mut Stage) -> Result<ImportReport> {
        tracing::info!("importing archive for {:?}", request.label);

        let segment = self.validate(request)?;
        let destination = self.library_root.join(&segment);
        advance(stage, Stage::Validated);

        let mut stats = RunStats {
            download_bytes: request.downloaded_bytes,
            ..RunStats::default()
        };

        let options = ExtractOptions::default().keep_staging(self.keep_temp);
        let staged = extract_to_staging(&request.archive, self.tmp_dir.as_deref(), &options)?;
        stats.extracted_entries = staged.entry_count();
        tracing::debug!(
            files = staged.report().files().count(),
            bytes = staged.report().total_bytes,
            "staged archive contents"
        );
        advance(stage, Stage::Extracted);

        let pruned = prune(staged.path(), &self.patterns, self.dry_run)?;
        stats.pruned = pruned.removed.len();
        advance(stage, Stage::Pruned);

        // Dry-run leaves pruned paths in staging; keep them out of the merge plan.
        let excluded: BTreeSet<PathBuf> = if self.dry_run {
            pruned.removed.iter().cloned().collect()
        } else {
            BTreeSet::new()
        };
        let merged = merge_excluding(staged.path(), &destination, self.dry_run, &excluded)?;
        stats.moved_files = merged.files_copied;
        advance(stage, Stage::Merged);

        drop(staged);
        advance(stage, Stage::Done);

        let report = ImportReport {
            destination,
            stats,
            dry_run: self.dry_run,
        };
        tracing::info!("{report}");
        Ok(report)
    }

    /// Check everything that does not depend on the archive: the label, the
    /// library root and the tmp directory. Returns the destination folder.
    pub fn preflight(&self, label: &str) -> Result<PathBuf> {
        let segment = self.check_environment(label)?;
        Ok(self.library_root.join(segment))
    }

    fn validate(&self, request: &ImportRequest) -> Result<SafeSegment> {
        let segment = self.check_environment(&request.label)?;

        let archive = &request.archive;
        match std::fs::metadata(archive) {
            Ok(metadata) if metadata.is_file() => Ok(segment),
            Ok(_) => Err(ImportError::InvalidInput(format!(
                "archive {} is not a regular file",
                archive.display()
            ))),
            Err(e) => Err(ImportError::InvalidInput(format!(
                "archive {} not accessible: {e}",
                archive.display()
            ))),
        }
    }

    fn check_environment(&self, label: &str) -> Result<SafeSegment> {
        if label.trim().is_empty() {
            return Err(ImportError::InvalidInput("artist is required".into()));
        }
        let segment = sanitize_label(label)?;

        if !self.library_root.is_dir() {
            return Err(ImportError::InvalidInput(format!(
                "library root {} is not an accessible directory",
                self.library_root.display()
            )));
        }

        if let Some(tmp_dir) = &self.tmp_dir {
            if !tmp_dir.is_absolute() {
                return Err(ImportError::InvalidInput(format!(
                    "tmp-dir must be absolute: {:?}",
                    tmp_dir
                )));
            }
            if !tmp_dir.is_dir() {
                return Err(ImportError::InvalidInput(format!(
                    "tmp-dir {} is not an accessible directory",
                    tmp_dir.display()
                )));
            }
        }

        Ok(segment)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    tracing::debug!(from = %stage, to = %next, "pipeline stage");
    *stage = next;
}
