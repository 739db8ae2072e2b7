use std::fmt;
use std::path::PathBuf;

/// Counters accumulated over a single import run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Size of the downloaded archive, when a download preceded the run.
    pub download_bytes: Option<u64>,
    pub extracted_entries: usize,
    pub pruned: usize,
    pub moved_files: usize,
}

/// Summary handed back to the caller after a successful run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportReport {
    pub destination: PathBuf,
    pub stats: RunStats,
    pub dry_run: bool,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.dry_run { "Dry-run complete" } else { "Import complete" };
        write!(f, "{prefix} -> {} (", self.destination.display())?;
        if let Some(bytes) = self.stats.download_bytes {
            write!(f, "downloaded {}, ", human_bytes(bytes))?;
        }
        write!(
            f,
            "extracted {} entries, pruned {}, moved {} files)",
            self.stats.extracted_entries, self.stats.pruned, self.stats.moved_files
        )
    }
}

/// Format a byte count with binary (1024) steps, e.g. `1.5 MB`.
pub fn human_bytes(n: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];

    if n < 1024 {
        return format!("{n} B");
    }
    let mut div = 1024u64;
    let mut exp = 0usize;
    let mut m = n / 1024;
    while m >= 1024 && exp < UNITS.len() - 1 {
        div *= 1024;
        exp += 1;
        m /= 1024;
    }
    format!("{:.1} {}", n as f64 / div as f64, UNITS[exp])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_bytes_units() {
        assert_eq!(human_bytes(0), "0 B");
        assert_eq!(human_bytes(1023), "1023 B");
        assert_eq!(human_bytes(1024), "1.0 KB");
        assert_eq!(human_bytes(1536), "1.5 KB");
        assert_eq!(human_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(human_bytes(3 * 1024u64.pow(3) / 2), "1.5 GB");
        assert_eq!(human_bytes(2 * 1024u64.pow(6)), "2048.0 PB");
    }

    #[test]
    fn summary_line() {
        let report = ImportReport {
            destination: PathBuf::from("/music/Artist"),
            stats: RunStats {
                download_bytes: Some(2048),
                extracted_entries: 12,
                pruned: 3,
                moved_files: 9,
            },
            dry_run: false,
        };
        assert_eq!(
            report.to_string(),
            "Import complete -> /music/Artist (downloaded 2.0 KB, extracted 12 entries, pruned 3, moved 9 files)"
        );
    }

    #[test]
    fn summary_line_without_download() {
        let report = ImportReport {
            destination: PathBuf::from("/music/Artist"),
            stats: RunStats::default(),
            dry_run: true,
        };
        assert_eq!(
            report.to_string(),
            "Dry-run complete -> /music/Artist (extracted 0 entries, pruned 0, moved 0 files)"
        );
    }
}
