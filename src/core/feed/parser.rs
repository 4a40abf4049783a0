//! ATOM feed download and entry extraction
//!
//! The feed document is cached on disk for the day, so a re-run reuses it.
//! The document is split into `<entry>` fragments which are deserialized and
//! converted on a small rayon pool; malformed entries are skipped with a
//! warning and the result is sorted by id.

use crate::adapters::http::ArchiveDownloader;
use crate::domain::{FeedEntry, IngestError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Title used for entries without one
const UNKNOWN_TITLE: &str = "Unknown";

/// A downloaded feed document
#[derive(Debug, Clone)]
pub struct FeedDocument {
    /// Cached location on disk
    pub path: PathBuf,

    /// Raw XML
    pub xml: String,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    id: Option<TextNode>,
    #[serde(default)]
    title: Option<TextNode>,
    #[serde(default)]
    updated: Option<TextNode>,
    #[serde(rename = "link", default)]
    links: Vec<RawLink>,
}

#[derive(Debug, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    value: Option<String>,
}

impl TextNode {
    fn text(&self) -> Option<&str> {
        self.value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct RawLink {
    #[serde(rename = "@href", default)]
    href: Option<String>,
}

/// Location of the cached feed for a given day
///
/// `<dir>/<YYYY-MM-DD>_atom_feed.xml`
pub fn feed_cache_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("{}_atom_feed.xml", date.format("%Y-%m-%d")))
}

/// Fetches the cadastral feed and turns it into [`FeedEntry`] values
pub struct FeedParser {
    downloader: Arc<dyn ArchiveDownloader>,
    workers: usize,
}

impl FeedParser {
    /// Create a parser using `workers` threads for entry extraction
    pub fn new(downloader: Arc<dyn ArchiveDownloader>, workers: usize) -> Self {
        Self {
            downloader,
            workers: workers.max(1),
        }
    }

    /// Download the feed into `dest` unless it is already cached there
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails (no partial file is left behind)
    /// or the cached file cannot be read.
    pub async fn fetch_feed(&self, url: &str, dest: &Path) -> Result<FeedDocument> {
        if dest.exists() {
            tracing::info!(path = %dest.display(), "Feed already cached, skipping download");
        } else {
            tracing::info!(url = %url, "Downloading feed");
            let bytes = self.downloader.download(url, dest).await.map_err(|e| {
                tracing::error!(url = %url, error = %e, "Failed to download feed");
                e
            })?;
            tracing::info!(path = %dest.display(), bytes = bytes, "Feed downloaded");
        }

        let xml = tokio::fs::read_to_string(dest).await?;
        Ok(FeedDocument {
            path: dest.to_path_buf(),
            xml,
        })
    }

    /// Extract valid entries, sorted ascending by id
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Feed`] if the document is not a parseable feed.
    /// The cached file is removed in that case so the next run downloads it again.
    pub fn parse_entries(&self, document: &FeedDocument) -> Result<Vec<FeedEntry>> {
        let fragments = match split_entries(&document.xml) {
            Ok(fragments) => fragments,
            Err(e) => {
                discard_cached_feed(&document.path);
                return Err(IngestError::Feed(format!(
                    "Failed to parse feed {}: {}",
                    document.path.display(),
                    e
                )));
            }
        };

        let raw_count = fragments.len();
        tracing::info!(
            entries = raw_count,
            workers = self.workers,
            "Extracting feed entries"
        );

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|idx| format!("feed-parse-{idx}"))
            .build()
            .map_err(|e| IngestError::Other(format!("Failed to build parse pool: {}", e)))?;

        let mut entries: Vec<FeedEntry> = pool.install(|| {
            fragments
                .into_par_iter()
                .filter_map(|fragment| parse_entry(&fragment))
                .collect()
        });
        entries.sort_by_key(|entry| entry.id);

        tracing::info!(
            extracted = entries.len(),
            skipped = raw_count - entries.len(),
            "Extracted feed entries"
        );
        Ok(entries)
    }
}

/// Cut the document into standalone `<entry>` fragments
///
/// Only the document structure is checked here; each fragment is
/// deserialized on its own so one bad entry cannot fail the feed.
fn split_entries(xml: &str) -> std::result::Result<Vec<String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut fragments = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) if start.local_name().as_ref() == b"entry" => {
                let inner = reader.read_text(start.name())?;
                fragments.push(format!("<entry>{inner}</entry>"));
            }
            Event::Empty(empty) if empty.local_name().as_ref() == b"entry" => {
                tracing::warn!("Skipping entry: empty element");
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(fragments)
}

fn parse_entry(fragment: &str) -> Option<FeedEntry> {
    match quick_xml::de::from_str::<RawEntry>(fragment) {
        Ok(raw) => convert_entry(raw),
        Err(e) => {
            tracing::warn!(error = %e, "Skipping entry: malformed XML");
            None
        }
    }
}

fn convert_entry(raw: RawEntry) -> Option<FeedEntry> {
    let title = raw
        .title
        .as_ref()
        .and_then(TextNode::text)
        .unwrap_or(UNKNOWN_TITLE)
        .to_string();

    let Some(link) = raw.links.first() else {
        tracing::warn!(title = %title, "Skipping entry: no link found");
        return None;
    };

    let url = link.href.as_deref().map(str::trim).unwrap_or_default();
    if url.is_empty() {
        tracing::warn!(title = %title, "Skipping entry: empty href");
        return None;
    }

    let Some(raw_id) = raw.id.as_ref().and_then(TextNode::text) else {
        tracing::warn!(title = %title, "Skipping entry: no id found");
        return None;
    };

    let Some(id) = FeedEntry::parse_identifier(raw_id) else {
        tracing::warn!(title = %title, raw_id = %raw_id, "Skipping entry: malformed id");
        return None;
    };

    let mut entry = FeedEntry::new(id, title, url);
    if let Some(updated) = raw.updated.as_ref().and_then(TextNode::text) {
        match DateTime::parse_from_rfc3339(updated) {
            Ok(ts) => entry = entry.with_updated_at(ts.with_timezone(&Utc)),
            Err(e) => {
                tracing::debug!(id = id, updated = %updated, error = %e, "Ignoring unparseable update time")
            }
        }
    }
    Some(entry)
}

fn discard_cached_feed(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove unparseable feed");
    }
}
