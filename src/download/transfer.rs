//! Single file transfer
//!
//! Streams one response body to disk. Between chunks the transfer honors
//! the shared pause gate and its own cancel flag; a cancelled transfer
//! stops mid stream and leaves the partial file on disk.

use futures_util::StreamExt;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::control::{CancelFlag, PauseGate};
use crate::crawler::ListingClient;
use crate::events::{Event, EventSender};
use crate::DownloadError;

use super::coordinator::DownloadRequest;

/// Terminal state of one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The whole body was written and flushed.
    Completed,
    /// The cancel flag fired mid stream; a partial file remains.
    Cancelled,
}

/// Streams `request.url` into `request.destination`.
///
/// Progress events fire on whole-percent changes when the server
/// reported a length, and always once at 100 on completion. Pause is
/// honored before each chunk is written; cancellation wins over an open
/// gate and is checked on the same boundary.
pub(super) async fn transfer(
    client: &ListingClient,
    request: &DownloadRequest,
    pause: &PauseGate,
    cancel: &CancelFlag,
    events: &EventSender,
) -> Result<TransferOutcome, DownloadError> {
    let response = client.get_stream(&request.url).await?;
    let total_size = response.content_length().unwrap_or(0);

    if let Some(parent) = request.destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| DownloadError::io(parent.to_path_buf(), source))?;
    }
    let file = File::create(&request.destination)
        .await
        .map_err(|source| DownloadError::io(request.destination.clone(), source))?;
    let mut writer = BufWriter::new(file);

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut last_whole_percent: u64 = 0;
    let mut cancelled = false;

    while let Some(chunk_result) = stream.next().await {
        tokio::select! {
            _ = pause.wait_open() => {}
            _ = cancel.cancelled() => {
                cancelled = true;
            }
        }
        if cancelled || cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        let chunk =
            chunk_result.map_err(|source| DownloadError::network(&request.url, source))?;
        downloaded += chunk.len() as u64;
        writer
            .write_all(&chunk)
            .await
            .map_err(|source| DownloadError::io(request.destination.clone(), source))?;

        if total_size > 0 {
            let percent = (downloaded as f64 / total_size as f64) * 100.0;
            let whole = percent as u64;
            if whole > last_whole_percent {
                last_whole_percent = whole;
                let _ = events.send(Event::DownloadProgress {
                    destination: request.destination.clone(),
                    name: request.name.clone(),
                    percent,
                });
            }
        }
    }

    // Written bytes must be on disk whether we finished or were cut off;
    // the partial file is the user-visible artifact of a cancellation.
    writer
        .flush()
        .await
        .map_err(|source| DownloadError::io(request.destination.clone(), source))?;

    if cancelled {
        debug!("stopping download of {}", request.name);
        return Ok(TransferOutcome::Cancelled);
    }

    let _ = events.send(Event::DownloadProgress {
        destination: request.destination.clone(),
        name: request.name.clone(),
        percent: 100.0,
    });
    Ok(TransferOutcome::Completed)
}
