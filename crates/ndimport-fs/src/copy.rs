use crate::permissions;
use crate::{Error, Result};
use std::fs::File;
use std::path::Path;

/// Copy the bytes of `src` into `dest`, creating `dest` with `mode`.
///
/// Returns the number of bytes copied.
pub fn copy_file(src: &Path, dest: &Path, mode: u32) -> Result<u64> {
    let mut input = File::open(src).map_err(|e| Error::Read {
        path: src.to_path_buf(),
        source: e,
    })?;
    let mut output = permissions::create_file(dest, mode)?;

    std::io::copy(&mut input, &mut output).map_err(|e| Error::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}

/// Remove a file or a whole directory tree.
pub fn remove_all(path: &Path) -> Result<()> {
    let metadata = std::fs::symlink_metadata(path).map_err(|e| Error::Remove {
        path: path.to_path_buf(),
        source: e,
    })?;

    let result = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| Error::Remove {
        path: path.to_path_buf(),
        source: e,
    })
}
