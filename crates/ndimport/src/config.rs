use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

const ENV_KEYS: [&str; 3] = ["NAVIDROME_MUSIC_PATH", "UNNEEDED_FILES", "PIXELDRAIN_TOKEN"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("NAVIDROME_MUSIC_PATH is required (absolute path to Navidrome music root)")]
    MissingMusicPath,
    #[error("NAVIDROME_MUSIC_PATH must be an absolute path: {0:?}")]
    RelativeMusicPath(PathBuf),
    #[error("NAVIDROME_MUSIC_PATH {path:?} is not accessible: {source}")]
    Inaccessible {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("NAVIDROME_MUSIC_PATH {0:?} is not a directory")]
    NotADirectory(PathBuf),
    #[error("config file {0:?} does not exist")]
    MissingFile(PathBuf),
    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),
}

/// Patterns may be written as a comma separated string (the environment
/// form) or as a TOML array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PatternList {
    Csv(String),
    List(Vec<String>),
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    navidrome_music_path: Option<String>,
    unneeded_files: Option<PatternList>,
    pixeldrain_token: Option<String>,
}

/// Validated settings for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub music_path: PathBuf,
    pub unneeded_patterns: Vec<String>,
    pub pixeldrain_token: Option<String>,
}

impl Config {
    /// Load `.env` if present, then layer the optional TOML file and the
    /// environment (environment wins).
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }

        let mut figment = Figment::new();
        if let Some(file) = file {
            if !file.is_file() {
                return Err(ConfigError::MissingFile(file.to_path_buf()));
            }
            figment = figment.merge(Toml::file(file));
        }
        figment = figment.merge(Env::raw().only(&ENV_KEYS));

        Self::from_figment(&figment)
    }

    fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let raw: RawConfig = figment.extract().map_err(Box::new)?;
        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> Result<Self, ConfigError> {
        let music_path = raw
            .navidrome_music_path
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .ok_or(ConfigError::MissingMusicPath)?;

        if !music_path.is_absolute() {
            return Err(ConfigError::RelativeMusicPath(music_path));
        }
        let metadata = std::fs::metadata(&music_path).map_err(|e| ConfigError::Inaccessible {
            path: music_path.clone(),
            source: e,
        })?;
        if !metadata.is_dir() {
            return Err(ConfigError::NotADirectory(music_path));
        }

        let unneeded_patterns = match raw.unneeded_files {
            Some(PatternList::Csv(csv)) => parse_patterns(&csv),
            Some(PatternList::List(list)) => list
                .iter()
                .map(|p| p.trim())
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };

        let pixeldrain_token = raw
            .pixeldrain_token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        Ok(Self {
            music_path,
            unneeded_patterns,
            pixeldrain_token,
        })
    }
}

/// Split a comma separated pattern list, trimming items and dropping empties.
pub fn parse_patterns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
