//! Feed entries and downloaded artifacts
//!
//! A [`FeedEntry`] describes one archive advertised by the cadastral ATOM
//! feed. A [`DownloadedArtifact`] is a local archive waiting for extraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One downloadable archive discovered in the feed
///
/// Entries are immutable once parsed and live only for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    /// Numeric identifier parsed from the entry's `<id>` suffix
    pub id: u64,

    /// Human-readable title
    pub title: String,

    /// Archive download URL
    pub url: String,

    /// Last modification time advertised by the feed
    pub updated_at: Option<DateTime<Utc>>,
}

impl FeedEntry {
    /// Create a new feed entry
    pub fn new(id: u64, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            url: url.into(),
            updated_at: None,
        }
    }

    /// Set the last modification time
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Parse the numeric id out of a structured identifier
    ///
    /// The id is the text after the last `-`, cut at the first `.`:
    /// `https://example.com/ko-123456.zip` yields `123456`.
    ///
    /// Returns `None` when the identifier has no `-` or the suffix is not a number.
    pub fn parse_identifier(raw: &str) -> Option<u64> {
        let (_, suffix) = raw.trim().rsplit_once('-')?;
        let number = suffix.split('.').next()?;
        number.parse().ok()
    }

    /// File name used when storing this entry's archive locally
    ///
    /// Uses the last path segment of the URL, falling back to `<id>.zip`.
    pub fn file_name(&self) -> String {
        file_name_from_url(&self.url).unwrap_or_else(|| format!("{}.zip", self.id))
    }
}

/// Last non-empty path segment of a URL
pub fn file_name_from_url(raw: &str) -> Option<String> {
    let parsed = url::Url::parse(raw).ok()?;
    parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_string)
}

/// An archive on local disk, owned by whoever holds it
///
/// The file is deleted when the artifact is dropped, so an archive that is
/// never extracted (a sibling failed, the run was interrupted) does not stay
/// behind.
#[derive(Debug, PartialEq, Eq)]
pub struct DownloadedArtifact {
    /// Local archive path
    pub path: PathBuf,

    /// Originating feed entry (absent for single-archive datasets)
    pub entry: Option<FeedEntry>,
}

impl DownloadedArtifact {
    /// Artifact produced from a feed entry
    pub fn from_entry(path: PathBuf, entry: FeedEntry) -> Self {
        Self {
            path,
            entry: Some(entry),
        }
    }

    /// Artifact for a single-archive dataset
    pub fn standalone(path: PathBuf) -> Self {
        Self { path, entry: None }
    }

    /// Local archive path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DownloadedArtifact {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed archive"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove archive")
            }
        }
    }
}
