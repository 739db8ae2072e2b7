use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Mode used for directories created while staging or merging.
pub const DIR_MODE: u32 = 0o755;

/// Mode used for files whose origin declares none.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Keep only permission bits (rwx for user/group/other plus setuid/setgid/sticky).
pub fn permission_bits(mode: u32) -> u32 {
    mode & 0o7777
}

/// Create `path` and every missing ancestor with `mode`.
///
/// On non-Unix platforms the mode is ignored.
pub fn create_dir_all(path: &Path, mode: u32) -> Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder.create(path).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Open `path` for writing, creating or truncating it. A newly created file
/// receives `mode` (subject to the process umask).
pub fn create_file(path: &Path, mode: u32) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(permission_bits(mode));
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(path).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Permission bits of an existing file, or [`DEFAULT_FILE_MODE`] where the
/// platform has none.
pub fn mode_of(metadata: &std::fs::Metadata) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permission_bits(metadata.permissions().mode())
    }
    #[cfg(not(unix))]
    {
        let _ = metadata;
        DEFAULT_FILE_MODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_permission_bits_strip_file_type() {
        assert_eq!(permission_bits(0o100644), 0o644);
        assert_eq!(permission_bits(0o040755), 0o755);
    }

    #[test]
    fn test_create_dir_all_nested() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        create_dir_all(&nested, DIR_MODE).unwrap();
        assert!(nested.is_dir());
        // existing directory is fine
        create_dir_all(&nested, DIR_MODE).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_create_file_applies_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("tool.sh");
        drop(create_file(&path, 0o700).unwrap());
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[test]
    fn test_create_file_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        std::fs::write(&path, "old content").unwrap();
        drop(create_file(&path, DEFAULT_FILE_MODE).unwrap());
        assert_eq!(std::fs::read(&path).unwrap(), b"");
    }
}
