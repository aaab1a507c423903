//! Scan session orchestration
//!
//! This module drives a scan from start to finish:
//! - Clearing the tree model and walking the listing tree
//! - Fanning work items out to a bounded worker pool
//! - Folder creation, file reservation, probing, and rollback
//! - Honoring pause and stop requests between items
//! - Reporting progress and completion through the event channel

use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::control::{CancelFlag, PauseGate};
use crate::crawler::fetcher::ListingClient;
use crate::crawler::walker::{walk, WorkItem};
use crate::events::{Event, EventSender};
use crate::model::{FileNode, TreeModel};
use crate::url::LinkKind;

/// How a scan session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// Walk and processing ran to the end.
    Completed,
    /// A stop request ended the session early.
    Stopped,
    /// The root URL never produced a walk.
    Failed,
}

/// Result of a start request.
#[derive(Debug)]
pub enum StartOutcome {
    /// A new session began; the handle resolves to its outcome.
    Started(JoinHandle<ScanOutcome>),
    /// A session was already running and was asked to stop instead.
    StopRequested,
}

struct SessionHandle {
    stop: CancelFlag,
}

/// Orchestrates scan sessions over a shared [`TreeModel`].
///
/// Only one session runs at a time. Starting while a session is active
/// is interpreted as a stop request for the running session, mirroring a
/// scan button that turns into a stop button.
pub struct Scanner {
    client: Arc<ListingClient>,
    model: Arc<TreeModel>,
    events: EventSender,
    workers: usize,
    session: Mutex<Option<SessionHandle>>,
}

impl Scanner {
    /// Builds a scanner and its HTTP client from the configuration.
    pub fn new(
        config: &Config,
        model: Arc<TreeModel>,
        events: EventSender,
    ) -> crate::Result<Self> {
        let client = Arc::new(ListingClient::from_config(&config.http)?);
        Ok(Self {
            client,
            model,
            events,
            workers: config.scan.workers,
            session: Mutex::new(None),
        })
    }

    /// Starts a scan of `root`, or asks the active session to stop.
    ///
    /// On [`StartOutcome::Started`] the returned handle resolves once the
    /// session has fully wound down and the finish event was sent.
    pub fn start(self: &Arc<Self>, root: String, pause: PauseGate) -> StartOutcome {
        let mut session = self.session.lock().unwrap();
        if let Some(active) = session.as_ref() {
            info!("scan already running, requesting stop");
            active.stop.cancel();
            return StartOutcome::StopRequested;
        }

        let stop = CancelFlag::new();
        *session = Some(SessionHandle { stop: stop.clone() });
        let scanner = Arc::clone(self);
        StartOutcome::Started(tokio::spawn(async move {
            scanner.run(root, pause, stop).await
        }))
    }

    /// Requests a stop for the active session; no-op when idle.
    pub fn stop(&self) {
        if let Some(active) = self.session.lock().unwrap().as_ref() {
            active.stop.cancel();
        }
    }

    /// The HTTP client this scanner probes with, shareable with a downloader.
    pub fn client(&self) -> Arc<ListingClient> {
        Arc::clone(&self.client)
    }

    pub fn is_scanning(&self) -> bool {
        self.session.lock().unwrap().is_some()
    }

    async fn run(self: Arc<Self>, root: String, pause: PauseGate, stop: CancelFlag) -> ScanOutcome {
        let outcome = self.run_session(&root, &pause, &stop).await;
        *self.session.lock().unwrap() = None;

        let file_count = self.model.file_count();
        match outcome {
            ScanOutcome::Completed => {
                let text = if file_count == 0 {
                    "No files found".to_string()
                } else {
                    format!("Scan completed, found {} files", file_count)
                };
                let _ = self.events.send(Event::ScanStatus { text });
            }
            ScanOutcome::Stopped => {
                let _ = self.events.send(Event::ScanStatus {
                    text: "Scan stopped".to_string(),
                });
            }
            ScanOutcome::Failed => {}
        }
        info!("scan finished: {:?}, {} files", outcome, file_count);
        let _ = self.events.send(Event::ScanFinished { outcome, file_count });
        outcome
    }

    async fn run_session(&self, root: &str, pause: &PauseGate, stop: &CancelFlag) -> ScanOutcome {
        self.model.clear();
        let _ = self.events.send(Event::ScanStarted);
        let _ = self.events.send(Event::ScanStatus {
            text: "Scanning website...".to_string(),
        });
        info!("scanning {}", root);

        let items = match walk(self.client.as_ref(), root).await {
            Ok(items) => items,
            Err(err) => {
                warn!("scan of {} could not start: {}", root, err);
                let _ = self.events.send(Event::ScanStatus {
                    text: format!("Scan failed: {}", err),
                });
                return ScanOutcome::Failed;
            }
        };

        let total = items.len();
        let _ = self.events.send(Event::ScanProgress {
            processed: 0,
            total,
        });

        let pool = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(total);
        let mut stopped = false;

        for item in items {
            if !checkpoint(pause, stop).await {
                stopped = true;
                break;
            }
            let permit = tokio::select! {
                permit = Arc::clone(&pool).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = stop.cancelled() => {
                    stopped = true;
                    break;
                }
            };

            let client = Arc::clone(&self.client);
            let model = Arc::clone(&self.model);
            let events = self.events.clone();
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                process_item(&client, &model, &events, item).await;
            }));
        }

        let mut processed = 0usize;
        let mut pending = handles.into_iter();
        for handle in pending.by_ref() {
            if !checkpoint(pause, stop).await {
                stopped = true;
                if let Err(err) = handle.await {
                    warn!("scan worker failed: {}", err);
                }
                break;
            }
            if let Err(err) = handle.await {
                warn!("scan worker failed: {}", err);
            }
            processed += 1;
            let _ = self.events.send(Event::ScanProgress { processed, total });
            if processed % 10 == 0 {
                debug!("processed {}/{} listing entries", processed, total);
            }
        }

        // A stop only drops unsubmitted work. Whatever is in flight runs
        // to the end so its results are in the model before the finish
        // event goes out.
        for handle in pending {
            if let Err(err) = handle.await {
                warn!("scan worker failed: {}", err);
            }
        }

        if stopped {
            ScanOutcome::Stopped
        } else {
            ScanOutcome::Completed
        }
    }
}

/// Waits out a pause and reports whether the session may continue.
async fn checkpoint(pause: &PauseGate, stop: &CancelFlag) -> bool {
    if stop.is_cancelled() {
        return false;
    }
    tokio::select! {
        _ = pause.wait_open() => !stop.is_cancelled(),
        _ = stop.cancelled() => false,
    }
}

async fn process_item(
    client: &ListingClient,
    model: &TreeModel,
    events: &EventSender,
    item: WorkItem,
) {
    match item.kind {
        LinkKind::Directory => process_directory(model, events, &item),
        LinkKind::File => process_file(client, model, events, &item).await,
    }
}

fn process_directory(model: &TreeModel, events: &EventSender, item: &WorkItem) {
    let decoded = decode_path(&item.path);
    let created = model.ensure_folder(decoded.trim_matches('/'), &item.url);
    if !created.is_empty() {
        let _ = events.send(Event::FolderDiscovered {
            path: created,
            url: item.url.clone(),
        });
    }
}

async fn process_file(
    client: &ListingClient,
    model: &TreeModel,
    events: &EventSender,
    item: &WorkItem,
) {
    let (dir_raw, name_raw) = match item.path.rfind('/') {
        Some(idx) => (&item.path[..idx], &item.path[idx + 1..]),
        None => ("", item.path.as_str()),
    };
    let name = decode_path(name_raw);
    if name.is_empty() {
        return;
    }
    let dir = decode_path(dir_raw).trim_matches('/').to_string();
    let full_path = if dir.is_empty() {
        name.clone()
    } else {
        format!("{}/{}", dir, name)
    };

    // First worker to reserve the path wins; everyone else skips.
    if !model.reserve_file(&full_path) {
        return;
    }

    match client.probe(&item.url).await {
        Ok(meta) => {
            let node = FileNode {
                path: full_path.clone(),
                name,
                source_url: item.url.clone(),
                size_bytes: meta.size_bytes,
                content_type: meta.content_type,
                folder: if dir.is_empty() { None } else { Some(dir) },
                selected: false,
            };
            let size_label = node.size_label();
            let content_type = node.content_type.clone();
            if model.populate_file(node) {
                let _ = events.send(Event::FileDiscovered {
                    path: full_path,
                    url: item.url.clone(),
                    size_label,
                    content_type,
                });
            }
        }
        Err(err) => {
            warn!("could not probe file {}: {}", item.url, err);
            model.rollback_file(&full_path);
            let _ = events.send(Event::FileDiscoveryFailed { path: full_path });
        }
    }
}

fn decode_path(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
