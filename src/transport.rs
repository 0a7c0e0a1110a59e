use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result, connection_error, status_error};

/// The HTTP seam.
///
/// Implementations follow redirects and turn non-2xx answers into
/// [`Error::Transport`]. They never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value>;

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>>;

    /// Writes the body of `url` to `target` and returns the byte count.
    ///
    /// `target` only appears once the whole body is on disk.
    async fn download_to(&self, url: &str, target: &Path, _progress: bool) -> Result<u64> {
        let bytes = self.get_bytes(url).await?;
        let part = part_path(target);
        let written = tokio::fs::write(&part, &bytes)
            .await
            .map(|()| bytes.len() as u64)
            .map_err(|e| Error::io(&part, e));
        commit(&part, target, written).await
    }
}

/// Sibling of `target` that receives the body while it streams.
fn part_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}

/// Moves a finished `part` onto `target`, or removes it after a failure.
async fn commit(part: &Path, target: &Path, written: Result<u64>) -> Result<u64> {
    match written {
        Ok(written) => {
            tokio::fs::rename(part, target)
                .await
                .map_err(|e| Error::io(target, e))?;
            Ok(written)
        }
        Err(err) => {
            if let Err(e) = tokio::fs::remove_file(part).await {
                tracing::debug!(
                    path = %part.display(),
                    error = %e,
                    "could not remove partial file"
                );
            }
            Err(err)
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(verify: bool, timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("gisco-geodata-rs/{}", env!("CARGO_PKG_VERSION")))
                .unwrap_or(HeaderValue::from_static("gisco-geodata-rs")),
        );

        let mut builder = reqwest::Client::builder()
            .default_headers(default_headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(timeout);

        if !verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response> {
        tracing::debug!(url, "GET");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| connection_error(url, &e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(status, url, &text));
        }
        Ok(resp)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        let resp = self.send(url).await?;
        resp.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                Error::Decode {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            } else {
                connection_error(url, &e)
            }
        })
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self.send(url).await?;
        let bytes = resp.bytes().await.map_err(|e| connection_error(url, &e))?;
        Ok(bytes.to_vec())
    }

    async fn download_to(&self, url: &str, target: &Path, progress: bool) -> Result<u64> {
        let resp = self.send(url).await?;
        let part = part_path(target);
        let written = stream_to(resp, url, &part, progress).await;
        let written = commit(&part, target, written).await?;
        tracing::debug!(url, bytes = written, target = %target.display(), "downloaded");
        Ok(written)
    }
}

async fn stream_to(
    mut resp: reqwest::Response,
    url: &str,
    part: &Path,
    progress: bool,
) -> Result<u64> {
    let expected = resp.content_length();
    let pb = if progress {
        let pb = match expected {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} {bytes}/{total_bytes} ({bytes_per_sec}) {wide_bar} {eta}",
        ) {
            pb.set_style(style.progress_chars("=>-"));
        }
        Some(pb)
    } else {
        None
    };

    let mut out = tokio::fs::File::create(part)
        .await
        .map_err(|e| Error::io(part, e))?;

    let mut written: u64 = 0;
    while let Some(chunk) = resp.chunk().await.map_err(|e| connection_error(url, &e))? {
        out.write_all(&chunk).await.map_err(|e| Error::io(part, e))?;
        written += chunk.len() as u64;
        if let Some(pb) = &pb {
            pb.inc(chunk.len() as u64);
        }
    }
    out.flush().await.map_err(|e| Error::io(part, e))?;

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }
    match expected {
        Some(len) if len != written => Err(Error::Transport {
            url: url.to_string(),
            status: None,
            message: format!("body ended after {} of {} bytes", written, len),
        }),
        _ => Ok(written),
    }
}
