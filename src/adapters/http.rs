//! HTTP archive downloads
//!
//! One [`reqwest::Client`] is shared by every download of a run. Bodies are
//! streamed to disk chunk by chunk; a file that was not fully written is
//! removed before the error is returned.
//!
//! The timeout applies to each wait (headers, then every chunk), not to the
//! whole transfer, so a large archive that keeps arriving is never cut off.

use crate::config::DownloadConfig;
use crate::domain::{IngestError, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, ClientBuilder};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Fetches a remote archive into a local file
#[async_trait]
pub trait ArchiveDownloader: Send + Sync {
    /// Download `url` into `dest`, returning the number of bytes written
    ///
    /// # Errors
    ///
    /// Returns an error on a transport failure, a non-success status or a
    /// write failure. `dest` does not exist after an error.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// Streaming downloader over a shared HTTP client
#[derive(Clone)]
pub struct HttpDownloader {
    client: Client,
    idle_timeout: Duration,
}

impl HttpDownloader {
    /// Create a downloader with the configured timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .user_agent(concat!("cadastre-ingest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IngestError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            idle_timeout: Duration::from_secs(config.timeout_seconds),
        })
    }
}

#[async_trait]
impl ArchiveDownloader for HttpDownloader {
    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = tokio::time::timeout(self.idle_timeout, self.client.get(url).send())
            .await
            .map_err(|_| {
                IngestError::Http(format!(
                    "GET {} timed out after {}s waiting for a response",
                    url,
                    self.idle_timeout.as_secs()
                ))
            })??;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Http(format!(
                "GET {} returned status {}",
                url, status
            )));
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut partial = PartialFile::new(dest.to_path_buf());
        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        loop {
            let next = tokio::time::timeout(self.idle_timeout, stream.next())
                .await
                .map_err(|_| {
                    IngestError::Http(format!(
                        "GET {} stalled: no data for {}s after {} bytes",
                        url,
                        self.idle_timeout.as_secs(),
                        written
                    ))
                })?;
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        partial.commit();
        tracing::debug!(url = %url, path = %dest.display(), bytes = written, "Download finished");
        Ok(written)
    }
}

/// Removes a partially written file unless committed
struct PartialFile {
    path: PathBuf,
    committed: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            committed: false,
        }
    }

    fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove partial download");
            }
        }
    }
}
