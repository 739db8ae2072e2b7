//! Pixeldrain link resolution.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::Url;

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{3,}$").expect("pixeldrain id pattern"));

const SUPPORTED_HOSTS: [&str; 2] = ["pixeldrain.com", "doubledouble.top"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("url is required")]
    Empty,
    #[error("invalid URL {input:?}: {source}")]
    InvalidUrl {
        input: String,
        source: url::ParseError,
    },
    #[error("invalid URL {0:?}: missing host")]
    MissingHost(String),
    #[error("unsupported host {0:?}; expected Pixeldrain")]
    UnsupportedHost(String),
    #[error("missing Pixeldrain id in URL {0:?}")]
    MissingId(String),
    #[error("invalid Pixeldrain id {0:?}")]
    InvalidId(String),
}

/// A Pixeldrain file ready to be downloaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub id: String,
    pub download_url: String,
}

impl Resolved {
    fn from_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            download_url: format!("https://pixeldrain.com/api/file/{id}?download"),
        }
    }
}

/// Resolve a bare file id or a share link to the API download URL.
///
/// Links without a scheme get `https://`. The id is the last non-empty path
/// segment of the link.
pub fn resolve(raw: &str) -> Result<Resolved, ResolveError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ResolveError::Empty);
    }

    if is_id(raw) && !raw.contains('/') && !raw.contains('.') {
        return Ok(Resolved::from_id(raw));
    }

    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };
    let parsed = match Url::parse(&with_scheme) {
        Ok(parsed) => parsed,
        Err(url::ParseError::EmptyHost) => return Err(ResolveError::MissingHost(raw.to_string())),
        Err(e) => {
            return Err(ResolveError::InvalidUrl {
                input: raw.to_string(),
                source: e,
            });
        }
    };

    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .map(str::to_lowercase)
        .ok_or_else(|| ResolveError::MissingHost(raw.to_string()))?;
    if !SUPPORTED_HOSTS.iter().any(|supported| host.contains(supported)) {
        return Err(ResolveError::UnsupportedHost(host));
    }

    let id = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::trim)
        .ok_or_else(|| ResolveError::MissingId(raw.to_string()))?;
    if !is_id(id) {
        return Err(ResolveError::InvalidId(id.to_string()));
    }

    Ok(Resolved::from_id(id))
}

fn is_id(candidate: &str) -> bool {
    ID_PATTERN.is_match(candidate)
}
