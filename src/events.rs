//! Event stream from the core pipelines to the consuming front end
//!
//! The scan and download coordinators never touch presentation state
//! directly. Everything a front end needs to render, from per-item
//! discoveries to end-of-phase summaries, arrives as [`Event`] values on an
//! unbounded channel. Senders ignore a closed receiver so a front end that
//! exits early never wedges a worker.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::crawler::ScanOutcome;

/// A notification from the scan or download pipeline.
#[derive(Debug, Clone)]
pub enum Event {
    /// A scan session entered the running state.
    ScanStarted,
    /// Items processed so far out of the known total.
    ScanProgress { processed: usize, total: usize },
    /// Human-readable phase description ("Scanning...", "Stopping...").
    ScanStatus { text: String },
    /// Terminal scan report with the number of files in the model.
    ScanFinished {
        outcome: ScanOutcome,
        file_count: usize,
    },

    /// A folder path was added to the tree model.
    FolderDiscovered { path: String, url: String },
    /// A file's metadata probe succeeded and the node is populated.
    FileDiscovered {
        path: String,
        url: String,
        size_label: String,
        content_type: String,
    },
    /// A file's metadata probe failed; its reservation was rolled back.
    FileDiscoveryFailed { path: String },

    /// Transfer progress for one file, as a 0-100 percentage.
    DownloadProgress {
        destination: PathBuf,
        name: String,
        percent: f64,
    },
    /// Per-file status text ("Completed", "Cancelled", failure detail).
    DownloadStatus { destination: PathBuf, text: String },
    /// All submitted transfers settled.
    DownloadsFinished { succeeded: usize, total: usize },
}

/// Sending half of the event stream, cloned into every worker.
pub type EventSender = mpsc::UnboundedSender<Event>;

/// Receiving half, owned by the single consumer task.
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

/// Creates a connected event channel.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
