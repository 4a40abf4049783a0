//! Concurrent archive retrieval
//!
//! Batch downloads run under a semaphore so at most `max_concurrent` requests
//! are in flight. A failed download is logged and left out of the result;
//! sibling downloads carry on.

use crate::adapters::http::ArchiveDownloader;
use crate::domain::{file_name_from_url, DownloadedArtifact, FeedEntry, IngestError, Result};
use crate::log_download_progress;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Downloads feed archives and single-archive datasets
pub struct ArchiveFetcher {
    downloader: Arc<dyn ArchiveDownloader>,
    max_concurrent: usize,
    skip_existing_batch: bool,
}

impl ArchiveFetcher {
    /// Create a fetcher
    ///
    /// `skip_existing_batch` makes [`fetch_all`](Self::fetch_all) reuse files
    /// already present in the destination directory. Single-archive downloads
    /// always reuse them.
    pub fn new(
        downloader: Arc<dyn ArchiveDownloader>,
        max_concurrent: usize,
        skip_existing_batch: bool,
    ) -> Self {
        Self {
            downloader,
            max_concurrent: max_concurrent.max(1),
            skip_existing_batch,
        }
    }

    /// Download every entry's archive into `dest_dir`
    ///
    /// Returns the archives that were downloaded successfully, in completion
    /// order. Failures are logged and do not abort the batch. Entries sharing
    /// a file name are stored under `<id>.zip` instead.
    pub async fn fetch_all(
        &self,
        entries: Vec<FeedEntry>,
        dest_dir: &Path,
    ) -> Vec<DownloadedArtifact> {
        let planned = plan_destinations(entries, dest_dir);
        let total = planned.len();
        tracing::info!(
            archives = total,
            max_concurrent = self.max_concurrent,
            "Starting batch download"
        );

        if let Err(e) = tokio::fs::create_dir_all(dest_dir).await {
            tracing::error!(dir = %dest_dir.display(), error = %e, "Failed to create download directory");
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let completed = Arc::new(AtomicUsize::new(0));

        let downloads = planned.into_iter().map(|(entry, dest)| {
            let semaphore = Arc::clone(&semaphore);
            let completed = Arc::clone(&completed);

            async move {
                let _permit = semaphore.acquire().await.ok()?;

                if self.skip_existing_batch && dest.exists() {
                    tracing::info!(path = %dest.display(), "Archive already downloaded, skipping");
                    return Some(DownloadedArtifact::from_entry(dest, entry));
                }

                match self.downloader.download(&entry.url, &dest).await {
                    Ok(bytes) => {
                        let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                        tracing::info!(
                            id = entry.id,
                            path = %dest.display(),
                            bytes = bytes,
                            "Downloaded {}/{}",
                            done,
                            total
                        );
                        log_download_progress!(done, total);
                        Some(DownloadedArtifact::from_entry(dest, entry))
                    }
                    Err(e) => {
                        tracing::error!(id = entry.id, url = %entry.url, error = %e, "Failed to download archive");
                        None
                    }
                }
            }
        });

        let artifacts: Vec<DownloadedArtifact> = futures::future::join_all(downloads)
            .await
            .into_iter()
            .flatten()
            .collect();

        if artifacts.len() < total {
            tracing::warn!(
                requested = total,
                downloaded = artifacts.len(),
                "Some archives could not be downloaded"
            );
        } else {
            tracing::info!(downloaded = artifacts.len(), "Batch download finished");
        }
        artifacts
    }

    /// Download one archive into `dest_dir`, reusing an existing file
    ///
    /// # Errors
    ///
    /// Returns an error if the URL has no file name or the download fails.
    pub async fn fetch_single(&self, url: &str, dest_dir: &Path) -> Result<DownloadedArtifact> {
        let file_name = file_name_from_url(url)
            .ok_or_else(|| IngestError::Validation(format!("No file name in URL {url}")))?;
        let dest = dest_dir.join(file_name);

        if dest.exists() {
            tracing::info!(path = %dest.display(), "Archive already downloaded, skipping");
            return Ok(DownloadedArtifact::standalone(dest));
        }

        tokio::fs::create_dir_all(dest_dir).await?;
        let bytes = self.downloader.download(url, &dest).await?;
        tracing::info!(path = %dest.display(), bytes = bytes, "Downloaded archive");

        Ok(DownloadedArtifact::standalone(dest))
    }
}

/// Pair each entry with its destination file
///
/// Entries whose URL file name is already taken fall back to `<id>.zip`;
/// an entry whose fallback is taken as well duplicates an earlier one and
/// is dropped.
fn plan_destinations(entries: Vec<FeedEntry>, dest_dir: &Path) -> Vec<(FeedEntry, PathBuf)> {
    let mut taken = HashSet::new();
    entries
        .into_iter()
        .filter_map(|entry| {
            let name = entry.file_name();
            if taken.insert(name.clone()) {
                return Some((entry, dest_dir.join(name)));
            }

            let fallback = format!("{}.zip", entry.id);
            if taken.insert(fallback.clone()) {
                tracing::warn!(id = entry.id, file = %name, fallback = %fallback, "Archive file name already used, storing under id");
                Some((entry, dest_dir.join(fallback)))
            } else {
                tracing::warn!(id = entry.id, url = %entry.url, "Skipping duplicate feed entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_destinations_resolves_collisions() {
        let dir = Path::new("/data/dkp/2025-03-02");
        let entries = vec![
            FeedEntry::new(1, "KO 1", "https://example.com/a/archive.zip"),
            FeedEntry::new(2, "KO 2", "https://example.com/b/archive.zip"),
            FeedEntry::new(2, "KO 2 again", "https://example.com/c/archive.zip"),
            FeedEntry::new(3, "KO 3", "https://example.com/ko-3.zip"),
        ];

        let planned: Vec<(u64, PathBuf)> = plan_destinations(entries, dir)
            .into_iter()
            .map(|(entry, dest)| (entry.id, dest))
            .collect();

        assert_eq!(
            planned,
            vec![
                (1, dir.join("archive.zip")),
                (2, dir.join("2.zip")),
                (3, dir.join("ko-3.zip")),
            ]
        );
    }
}
