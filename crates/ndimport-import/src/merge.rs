//! Collision-checked merge of a staged tree into the library.
//!
//! The destination is only ever added to. Every staged path is checked
//! against the destination first; a single overlap aborts the merge before
//! the destination is touched.

use std::collections::BTreeSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use ndimport_fs::{DIR_MODE, permissions};
use walkdir::WalkDir;

use crate::error::{ImportError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionKind {
    /// A staged directory maps onto an existing file.
    DirectoryOverFile,
    /// A staged file maps onto an existing directory.
    FileOverDirectory,
    /// A staged file maps onto an existing file.
    FileExists,
}

impl fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DirectoryOverFile => "exists as a file",
            Self::FileOverDirectory => "exists as a directory",
            Self::FileExists => "already exists",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlannedKind {
    /// `exists` is set when the destination already has this directory.
    Directory { exists: bool },
    File { mode: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedEntry {
    pub relative: PathBuf,
    pub kind: PlannedKind,
}

/// Validated copy plan: every staged path, in walk order, none colliding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergePlan {
    pub destination: PathBuf,
    pub entries: Vec<PlannedEntry>,
}

impl MergePlan {
    pub fn file_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.kind, PlannedKind::File { .. }))
            .count()
    }

    /// Directories missing from the destination.
    pub fn new_directory_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.kind, PlannedKind::Directory { exists: false }))
            .count()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeReport {
    pub destination: PathBuf,
    /// Files copied, or in dry-run the files that would be copied.
    pub files_copied: usize,
    pub directories_created: usize,
    pub dry_run: bool,
}

/// Phase 1: compare the staged tree against `destination` without
/// modifying anything.
pub fn plan(staging_root: &Path, destination: &Path) -> Result<MergePlan> {
    plan_excluding(staging_root, destination, &BTreeSet::new())
}

/// Like [`plan`], skipping `excluded` relative paths and their subtrees.
///
/// Used in dry-run, where pruned paths are still present in staging.
pub fn plan_excluding(
    staging_root: &Path,
    destination: &Path,
    excluded: &BTreeSet<PathBuf>,
) -> Result<MergePlan> {
    if let Some(existing) = stat(destination)? {
        if !existing.is_dir {
            return Err(ImportError::Collision {
                path: destination.to_path_buf(),
                kind: CollisionKind::DirectoryOverFile,
            });
        }
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(staging_root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ImportError::Walk {
            path: staging_root.to_path_buf(),
            source: e,
        })?;
        let Ok(relative) = entry.path().strip_prefix(staging_root) else {
            continue;
        };
        if excluded.iter().any(|skip| relative.starts_with(skip)) {
            continue;
        }
        let is_dir = entry.file_type().is_dir();
        let target = destination.join(relative);

        let existing = stat(&target)?;
        if let Some(existing) = &existing {
            let kind = match (is_dir, existing.is_dir) {
                (true, true) => None,
                (true, false) => Some(CollisionKind::DirectoryOverFile),
                (false, true) => Some(CollisionKind::FileOverDirectory),
                (false, false) => Some(CollisionKind::FileExists),
            };
            if let Some(kind) = kind {
                return Err(ImportError::Collision { path: target, kind });
            }
        }

        let kind = if is_dir {
            PlannedKind::Directory {
                exists: existing.is_some(),
            }
        } else {
            let metadata = entry.metadata().map_err(|e| ImportError::Walk {
                path: entry.path().to_path_buf(),
                source: e,
            })?;
            PlannedKind::File {
                mode: permissions::mode_of(&metadata),
            }
        };
        entries.push(PlannedEntry {
            relative: relative.to_path_buf(),
            kind,
        });
    }

    Ok(MergePlan {
        destination: destination.to_path_buf(),
        entries,
    })
}

/// Phase 2: recreate the planned tree under the destination.
///
/// Stops at the first failure; files copied up to that point stay in place
/// and the error reports how many there were.
pub fn apply(staging_root: &Path, plan: &MergePlan) -> Result<MergeReport> {
    let destination = &plan.destination;
    permissions::create_dir_all(destination, DIR_MODE)?;

    let mut copied = 0usize;
    let mut directories = 0usize;
    let partial = |copied, source| ImportError::PartialMerge {
        destination: destination.clone(),
        copied,
        source,
    };

    for entry in &plan.entries {
        let target = destination.join(&entry.relative);
        match entry.kind {
            PlannedKind::Directory { exists } => {
                permissions::create_dir_all(&target, DIR_MODE).map_err(|e| partial(copied, e))?;
                if !exists {
                    directories += 1;
                }
            }
            PlannedKind::File { mode } => {
                if let Some(parent) = target.parent() {
                    permissions::create_dir_all(parent, DIR_MODE).map_err(|e| partial(copied, e))?;
                }
                ndimport_fs::copy_file(&staging_root.join(&entry.relative), &target, mode)
                    .map_err(|e| partial(copied, e))?;
                copied += 1;
            }
        }
    }

    tracing::info!("merged {} file(s) into {}", copied, destination.display());
    Ok(MergeReport {
        destination: destination.clone(),
        files_copied: copied,
        directories_created: directories,
        dry_run: false,
    })
}

/// Merge the staged tree into `destination`, refusing any overlap.
///
/// In dry-run the plan is validated and counted but the destination is not
/// created or modified.
pub fn merge(staging_root: &Path, destination: &Path, dry_run: bool) -> Result<MergeReport> {
    merge_excluding(staging_root, destination, dry_run, &BTreeSet::new())
}

/// [`merge`] ignoring `excluded` relative paths.
pub fn merge_excluding(
    staging_root: &Path,
    destination: &Path,
    dry_run: bool,
    excluded: &BTreeSet<PathBuf>,
) -> Result<MergeReport> {
    let plan = plan_excluding(staging_root, destination, excluded)?;

    if dry_run {
        let files = plan.file_count();
        let directories = plan.new_directory_count();
        tracing::info!(
            "dry-run: would merge {} file(s) into {}",
            files,
            destination.display()
        );
        return Ok(MergeReport {
            destination: plan.destination,
            files_copied: files,
            directories_created: directories,
            dry_run: true,
        });
    }

    apply(staging_root, &plan)
}

/// What already occupies a destination path.
struct Existing {
    is_dir: bool,
}

/// Presence is decided without following symlinks, so a dangling link still
/// counts as occupied. Links are only followed to learn whether the entry is
/// a directory.
fn stat(path: &Path) -> Result<Option<Existing>> {
    let read_err = |e| -> ImportError {
        ndimport_fs::Error::Read {
            path: path.to_path_buf(),
            source: e,
        }
        .into()
    };

    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(read_err(e)),
    };
    if !metadata.file_type().is_symlink() {
        return Ok(Some(Existing {
            is_dir: metadata.is_dir(),
        }));
    }

    match std::fs::metadata(path) {
        Ok(target) => Ok(Some(Existing {
            is_dir: target.is_dir(),
        })),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Some(Existing { is_dir: false })),
        Err(e) => Err(read_err(e)),
    }
}
