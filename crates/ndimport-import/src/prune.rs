//! Pattern pruning of a staged tree.
//!
//! Pruning is planned in full before anything is deleted: the plan records
//! every file in the tree and every path matching a pattern, and is rejected
//! outright when it would leave no file behind.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

use crate::error::{ImportError, Result};

/// Compiled prune patterns.
///
/// Patterns match `/`-separated paths relative to the staging root, case
/// sensitively. `*` stays within one segment, `**` spans any number of
/// segments (including none).
#[derive(Clone, Debug)]
pub struct PrunePatterns {
    patterns: Vec<String>,
    set: GlobSet,
}

impl Default for PrunePatterns {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }
}

impl PrunePatterns {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut raw = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| ImportError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source: e,
                })?;
            builder.add(glob);
            raw.push(pattern.to_string());
        }

        let set = builder.build().map_err(|e| ImportError::InvalidPattern {
            pattern: raw.join(","),
            source: e,
        })?;
        Ok(Self { patterns: raw, set })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.patterns
    }

    /// A path also matches when `relative/` does, so `Samples/**` covers
    /// an entry named `Samples` itself, whether directory or file.
    pub fn matches(&self, relative: &str) -> bool {
        self.set.is_match(relative) || self.set.is_match(format!("{relative}/"))
    }
}

/// What a prune would do, computed without touching the tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrunePlan {
    /// Matched paths relative to the staging root, in lexicographic order.
    /// Descendants of a matched directory are covered by it and not listed.
    pub candidates: BTreeSet<PathBuf>,
    pub files_before: usize,
    pub files_remaining: usize,
}

impl PrunePlan {
    pub fn removes_everything(&self) -> bool {
        self.files_before > 0 && self.files_remaining == 0
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Paths removed (or, in dry-run, that would be removed), relative to the
    /// staging root.
    pub removed: Vec<PathBuf>,
    pub files_before: usize,
    pub files_remaining: usize,
    pub dry_run: bool,
}

/// Walk `staging_root` once and compute the prune plan.
pub fn plan(staging_root: &Path, patterns: &PrunePatterns) -> Result<PrunePlan> {
    let mut plan = PrunePlan::default();
    let mut matched_dirs: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(staging_root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| ImportError::Walk {
            path: staging_root.to_path_buf(),
            source: e,
        })?;
        let Ok(relative) = entry.path().strip_prefix(staging_root) else {
            continue;
        };
        let is_dir = entry.file_type().is_dir();

        if !is_dir {
            plan.files_before += 1;
        }
        if matched_dirs.iter().any(|dir| relative.starts_with(dir)) {
            continue;
        }

        if patterns.matches(&to_slash(relative)) {
            if is_dir {
                matched_dirs.push(relative.to_path_buf());
            }
            plan.candidates.insert(relative.to_path_buf());
        } else if !is_dir {
            plan.files_remaining += 1;
        }
    }

    Ok(plan)
}

/// Remove every staged path matching `patterns`.
///
/// Fails with [`ImportError::PruneWouldRemoveEverything`] before deleting
/// anything when no file would survive. Removal itself is not atomic: an
/// I/O failure leaves earlier candidates removed.
pub fn prune(staging_root: &Path, patterns: &PrunePatterns, dry_run: bool) -> Result<PruneReport> {
    if patterns.is_empty() {
        return Ok(PruneReport {
            dry_run,
            ..PruneReport::default()
        });
    }

    let plan = plan(staging_root, patterns)?;
    if plan.removes_everything() {
        return Err(ImportError::PruneWouldRemoveEverything {
            files: plan.files_before,
        });
    }

    for relative in &plan.candidates {
        let path = staging_root.join(relative);
        if dry_run {
            tracing::info!("dry-run: would remove {}", path.display());
            continue;
        }
        ndimport_fs::remove_all(&path)?;
        tracing::debug!(path = %relative.display(), "pruned");
    }

    if !plan.candidates.is_empty() {
        tracing::info!("pruned {} item(s) matching prune patterns", plan.candidates.len());
    }

    Ok(PruneReport {
        removed: plan.candidates.into_iter().collect(),
        files_before: plan.files_before,
        files_remaining: plan.files_remaining,
        dry_run,
    })
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
