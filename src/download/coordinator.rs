//! Download batch coordination
//!
//! Spawns one task per selected file over a resizable semaphore pool.
//! Every transfer gets its own cancel flag; the shared pause gate
//! suspends all of them at chunk boundaries. A monitor task counts
//! successes and reports the batch result once every transfer is done.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::control::{CancelFlag, PauseGate};
use crate::crawler::ListingClient;
use crate::events::{Event, EventSender};
use crate::RipperError;

use super::transfer::{transfer, TransferOutcome};

/// Minimum allowed worker count.
pub const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 10;

/// Worker count used when nothing is configured.
pub const DEFAULT_WORKERS: usize = 5;

/// One file to download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Source URL.
    pub url: String,
    /// Absolute destination path on disk.
    pub destination: PathBuf,
    /// Display name used in progress events.
    pub name: String,
}

/// Control handle for one submitted transfer.
#[derive(Debug, Clone)]
pub struct DownloadHandle {
    pub destination: PathBuf,
    pub name: String,
    cancel: CancelFlag,
}

impl DownloadHandle {
    /// Cancels this transfer. Bytes already on disk stay there.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Download coordinator with a bounded, resizable worker pool.
///
/// The pool starts at the configured size and can be resized between
/// batches or mid-batch with [`set_workers`](Downloader::set_workers).
/// Resizing swaps the semaphore: transfers already holding a permit
/// drain on the old pool while queued ones move to the new limit.
pub struct Downloader {
    client: Arc<ListingClient>,
    events: EventSender,
    pause: PauseGate,
    pool: Mutex<Arc<Semaphore>>,
    workers: AtomicUsize,
}

impl Downloader {
    /// Creates a downloader with `workers` concurrent transfer slots.
    ///
    /// # Errors
    ///
    /// Returns [`RipperError::WorkerCount`] when `workers` is outside
    /// `1..=10`.
    pub fn new(
        client: Arc<ListingClient>,
        events: EventSender,
        pause: PauseGate,
        workers: usize,
    ) -> crate::Result<Self> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(RipperError::WorkerCount {
                value: workers,
                min: MIN_WORKERS,
                max: MAX_WORKERS,
            });
        }
        Ok(Self {
            client,
            events,
            pause,
            pool: Mutex::new(Arc::new(Semaphore::new(workers))),
            workers: AtomicUsize::new(workers),
        })
    }

    /// Currently configured worker count.
    pub fn workers(&self) -> usize {
        self.workers.load(Ordering::SeqCst)
    }

    /// Replaces the worker pool with one holding `workers` permits.
    pub fn set_workers(&self, workers: usize) -> crate::Result<()> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(RipperError::WorkerCount {
                value: workers,
                min: MIN_WORKERS,
                max: MAX_WORKERS,
            });
        }
        *self.pool.lock().unwrap() = Arc::new(Semaphore::new(workers));
        self.workers.store(workers, Ordering::SeqCst);
        debug!("download worker pool resized to {}", workers);
        Ok(())
    }

    /// Submits a batch of transfers.
    ///
    /// Returns one control handle per request plus a monitor task that
    /// resolves to `(succeeded, total)` once every transfer is done, in
    /// the same breath as the finished event. Individual failures and
    /// cancellations never abort the rest of the batch.
    pub fn submit(
        self: &Arc<Self>,
        requests: Vec<DownloadRequest>,
    ) -> (Vec<DownloadHandle>, JoinHandle<(usize, usize)>) {
        let total = requests.len();
        info!("starting {} downloads", total);

        let succeeded = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(total);
        let mut tasks = Vec::with_capacity(total);

        for request in requests {
            let cancel = CancelFlag::new();
            handles.push(DownloadHandle {
                destination: request.destination.clone(),
                name: request.name.clone(),
                cancel: cancel.clone(),
            });

            let downloader = Arc::clone(self);
            let succeeded = Arc::clone(&succeeded);
            tasks.push(tokio::spawn(async move {
                let pool = downloader.current_pool();
                tokio::select! {
                    permit = pool.acquire_owned() => {
                        let Ok(permit) = permit else { return };
                        let _permit = permit;
                        if downloader.run_one(&request, &cancel).await {
                            succeeded.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                    _ = cancel.cancelled() => {
                        debug!("download of {} cancelled while queued", request.name);
                        let _ = downloader.events.send(Event::DownloadStatus {
                            destination: request.destination.clone(),
                            text: "Cancelled".to_string(),
                        });
                    }
                }
            }));
        }

        let events = self.events.clone();
        let monitor = tokio::spawn(async move {
            for task in tasks {
                if let Err(err) = task.await {
                    warn!("download task failed: {}", err);
                }
            }
            let succeeded = succeeded.load(Ordering::SeqCst);
            info!("downloads finished: {}/{}", succeeded, total);
            let _ = events.send(Event::DownloadsFinished { succeeded, total });
            (succeeded, total)
        });

        (handles, monitor)
    }

    fn current_pool(&self) -> Arc<Semaphore> {
        Arc::clone(&self.pool.lock().unwrap())
    }

    async fn run_one(&self, request: &DownloadRequest, cancel: &CancelFlag) -> bool {
        match transfer(&self.client, request, &self.pause, cancel, &self.events).await {
            Ok(TransferOutcome::Completed) => {
                let _ = self.events.send(Event::DownloadStatus {
                    destination: request.destination.clone(),
                    text: "Completed".to_string(),
                });
                true
            }
            Ok(TransferOutcome::Cancelled) => {
                info!("download of {} cancelled", request.name);
                let _ = self.events.send(Event::DownloadStatus {
                    destination: request.destination.clone(),
                    text: "Cancelled".to_string(),
                });
                false
            }
            Err(err) => {
                warn!("error downloading {}: {}", request.name, err);
                let _ = self.events.send(Event::DownloadStatus {
                    destination: request.destination.clone(),
                    text: format!("Failed: {}", err),
                });
                false
            }
        }
    }
}
