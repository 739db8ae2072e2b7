//! Streaming archive download into a dedicated staging directory.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use ndimport_fs::StagingArea;
use ndimport_import::human_bytes;
use reqwest::{StatusCode, header};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::pixeldrain::Resolved;

pub const STAGING_PREFIX: &str = "nd-import-download-";
const USER_AGENT: &str = "nd-import/0.1";
const ERROR_BODY_LIMIT: usize = 4 << 10;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("download failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("download failed: status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("unexpected content-type {0:?} (expected zip) from Pixeldrain")]
    ContentType(String),
    #[error("downloaded file is empty")]
    Empty,
    #[error("write download {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Staging(#[from] ndimport_fs::Error),
}

/// A downloaded archive together with the directory that holds it.
///
/// Dropping this removes the file unless the staging area was kept.
#[derive(Debug)]
pub struct DownloadedArchive {
    staging: StagingArea,
    path: PathBuf,
    bytes: u64,
}

impl DownloadedArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }
}

#[derive(Clone, Debug)]
pub struct Downloader {
    client: reqwest::Client,
    token: Option<String>,
}

impl Downloader {
    pub fn new(token: Option<String>) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, token })
    }

    /// Stream `resolved` into a fresh staging directory under `base`.
    pub async fn fetch_archive(
        &self,
        resolved: &Resolved,
        base: Option<&Path>,
        keep: bool,
    ) -> Result<DownloadedArchive, DownloadError> {
        let mut staging = StagingArea::create(base, STAGING_PREFIX)?;
        staging.keep(keep);

        let mut request = self
            .client
            .get(&resolved.download_url)
            .header(header::ACCEPT, "application/zip");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        tracing::info!("downloading Pixeldrain file {} ...", resolved.id);
        let response = request.send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = read_limited(response, ERROR_BODY_LIMIT).await;
            return Err(DownloadError::Status { status, body });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        if let Some(content_type) = content_type {
            if !accepts_content_type(&content_type) {
                return Err(DownloadError::ContentType(content_type));
            }
        }

        let path = staging.path().join(format!("pixeldrain-{}.zip", resolved.id));
        let write_err = |source: std::io::Error| DownloadError::Write {
            path: path.clone(),
            source,
        };
        let mut file = tokio::fs::File::create(&path).await.map_err(write_err)?;

        let mut bytes = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(write_err)?;
            bytes += chunk.len() as u64;
        }
        file.flush().await.map_err(write_err)?;

        if bytes == 0 {
            return Err(DownloadError::Empty);
        }
        tracing::info!("downloaded {} to {}", human_bytes(bytes), path.display());

        Ok(DownloadedArchive {
            staging,
            path,
            bytes,
        })
    }
}

/// A missing content type is accepted; otherwise it must name a zip or a
/// generic binary stream.
pub fn accepts_content_type(content_type: &str) -> bool {
    content_type.contains("zip") || content_type.contains("octet-stream")
}

async fn read_limited(response: reqwest::Response, limit: usize) -> String {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(Ok(chunk)) = stream.next().await {
        body.extend_from_slice(&chunk);
        if body.len() >= limit {
            break;
        }
    }
    truncate_body(&body, limit)
}

fn truncate_body(body: &[u8], limit: usize) -> String {
    let body = &body[..body.len().min(limit)];
    String::from_utf8_lossy(body).trim().to_string()
}
