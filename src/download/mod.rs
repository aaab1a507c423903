//! Concurrent file downloads
//!
//! This module mirrors the scan side's worker pool for the transfer
//! path:
//! - Batch submission over a resizable semaphore pool
//! - One streamed transfer per file, with pause and cancel checks at
//!   chunk boundaries
//! - A monitor task that reports the batch result

mod coordinator;
mod transfer;

pub use coordinator::{
    DownloadHandle, DownloadRequest, Downloader, DEFAULT_WORKERS, MAX_WORKERS, MIN_WORKERS,
};
pub use transfer::TransferOutcome;
