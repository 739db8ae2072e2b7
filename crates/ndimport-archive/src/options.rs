use ndimport_fs::{DEFAULT_FILE_MODE, DIR_MODE};

/// Prefix given to extraction staging directories.
pub const STAGING_PREFIX: &str = "nd-import-extract-";

#[derive(Clone, Debug)]
pub struct ExtractOptions {
    pub default_file_mode: u32,
    pub dir_mode: u32,
    pub staging_prefix: String,
    pub keep_staging: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            default_file_mode: DEFAULT_FILE_MODE,
            dir_mode: DIR_MODE,
            staging_prefix: STAGING_PREFIX.to_string(),
            keep_staging: false,
        }
    }
}

impl ExtractOptions {
    pub fn default_file_mode(mut self, mode: u32) -> Self {
        self.default_file_mode = mode;
        self
    }

    pub fn dir_mode(mut self, mode: u32) -> Self {
        self.dir_mode = mode;
        self
    }

    pub fn staging_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.staging_prefix = prefix.into();
        self
    }

    pub fn keep_staging(mut self, keep: bool) -> Self {
        self.keep_staging = keep;
        self
    }

    /// Mode for a file entry: its declared permission bits, or the default
    /// when the archive declares none.
    pub fn file_mode(&self, declared: Option<u32>) -> u32 {
        declared
            .map(ndimport_fs::permissions::permission_bits)
            .filter(|mode| *mode != 0)
            .unwrap_or(self.default_file_mode)
    }
}
