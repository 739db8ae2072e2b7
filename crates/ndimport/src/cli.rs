use std::path::PathBuf;

use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(
    name = "nd-import",
    version = env!("CARGO_PKG_VERSION"),
    about = "Import a Pixeldrain zip into a Navidrome music library",
    after_help = "Environment: NAVIDROME_MUSIC_PATH is required; UNNEEDED_FILES and PIXELDRAIN_TOKEN are optional."
)]
pub struct Cli {
    /// Artist folder name to group tracks under
    #[arg(long, value_parser = non_blank)]
    pub artist: String,

    /// Pixeldrain download URL or file ID
    #[arg(long, value_parser = non_blank)]
    pub url: String,

    /// Directory for temporary download and extraction files (absolute)
    #[arg(long, value_name = "DIR", value_parser = non_blank_path)]
    pub tmp_dir: Option<PathBuf>,

    /// Keep downloaded and extracted files instead of cleaning up
    #[arg(long)]
    pub keep_temp: bool,

    /// Validate and plan actions without writing to the library
    #[arg(long)]
    pub dry_run: bool,

    /// Optional TOML file with the same keys as the environment
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long)]
    pub verbose: bool,
}

fn non_blank(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        Err("value must not be empty".to_string())
    } else {
        Ok(value.to_string())
    }
}

fn non_blank_path(value: &str) -> Result<PathBuf, String> {
    non_blank(value).map(PathBuf::from)
}
