//! Crawling pipeline for directory listing sites
//!
//! This module contains the full scan path, including:
//! - HTTP fetching, probing, and retry logic
//! - Link extraction from listing HTML
//! - Recursive traversal into the flattened work list
//! - Session orchestration over a bounded worker pool

mod coordinator;
mod extractor;
mod fetcher;
mod walker;

pub use coordinator::{ScanOutcome, Scanner, StartOutcome};
pub use extractor::extract_links;
pub use fetcher::{build_http_client, FileMeta, ListingClient};
pub use walker::{walk, WorkItem};
