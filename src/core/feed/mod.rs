//! Feed discovery and archive retrieval
//!
//! - [`parser`] - Cached ATOM feed download and entry extraction
//! - [`fetcher`] - Bounded concurrent archive downloads

pub mod fetcher;
pub mod parser;

pub use fetcher::ArchiveFetcher;
pub use parser::{feed_cache_path, FeedDocument, FeedParser};
