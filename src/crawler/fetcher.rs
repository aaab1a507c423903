//! HTTP client for listing pages, file probes, and download streams
//!
//! This module owns every request the crate sends:
//! - Building the shared HTTP client with the browser user agent string
//! - GET requests for listing page HTML
//! - HEAD probes that resolve file size and content type
//! - Streaming GET requests handed to the download workers
//! - Retry logic for transient server failures
//!
//! Timeouts are applied per request rather than on the client: listing
//! and probe requests get a total deadline, while download streams only
//! carry the connect timeout so large transfers are never cut off.

use std::time::Duration;

use reqwest::{Client, Method, Response};
use tokio::time::sleep;
use tracing::debug;

use crate::config::HttpConfig;
use crate::FetchError;

/// Status codes that trigger a retry with exponential backoff.
const RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Metadata resolved by a HEAD probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    /// Parsed `Content-Length`, `None` when missing or not a number.
    pub size_bytes: Option<u64>,
    /// Raw `Content-Type` header value, `"Unknown"` when absent.
    pub content_type: String,
}

/// Builds the HTTP client shared by scanning and downloading
///
/// # Arguments
///
/// * `config` - HTTP settings (user agent, timeouts)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(&config.user_agent)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// HTTP access layer for directory listing sites.
///
/// Every request goes through one retry loop that mirrors a browser
/// session with a mounted retry adapter: server errors in
/// [`RETRY_STATUSES`] and transport failures are retried with doubling
/// backoff, everything else fails immediately.
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 500/502/503/504 | Retry, backoff doubling from `retry-backoff-ms` |
/// | Timeout / transport error | Retry with the same backoff |
/// | Any other non-2xx | Immediate `FetchError::Status` |
/// | Attempts exhausted | Last error is returned |
#[derive(Debug, Clone)]
pub struct ListingClient {
    client: Client,
    read_timeout: Duration,
    probe_timeout: Duration,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl ListingClient {
    /// Wraps a built client with the retry and timeout settings from
    /// `config`.
    pub fn new(client: Client, config: &HttpConfig) -> Self {
        Self {
            client,
            read_timeout: Duration::from_secs(config.read_timeout_secs),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
            retry_attempts: config.retry_attempts.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Builds a client from `config` and wraps it in one step.
    pub fn from_config(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?, config))
    }

    /// Fetches a listing page and returns its HTML body.
    pub async fn get_html(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .send_with_retry(Method::GET, url, Some(self.read_timeout))
            .await?;
        response
            .text()
            .await
            .map_err(|source| FetchError::from_reqwest(url, source))
    }

    /// Resolves file metadata with a HEAD request, following redirects.
    pub async fn probe(&self, url: &str) -> Result<FileMeta, FetchError> {
        let response = self
            .send_with_retry(Method::HEAD, url, Some(self.probe_timeout))
            .await?;

        let size_bytes = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("Unknown")
            .to_string();

        Ok(FileMeta {
            size_bytes,
            content_type,
        })
    }

    /// Opens a streaming GET for a file download.
    ///
    /// The response is status-checked but the body is left unread; the
    /// caller consumes it chunk by chunk. No total deadline is applied,
    /// only the client connect timeout.
    pub async fn get_stream(&self, url: &str) -> Result<Response, FetchError> {
        self.send_with_retry(Method::GET, url, None).await
    }

    async fn send_with_retry(
        &self,
        method: Method,
        url: &str,
        timeout: Option<Duration>,
    ) -> Result<Response, FetchError> {
        let mut delay = self.retry_backoff;
        let mut attempt = 1;
        loop {
            let mut request = self.client.request(method.clone(), url);
            if let Some(deadline) = timeout {
                request = request.timeout(deadline);
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if RETRY_STATUSES.contains(&status.as_u16())
                        && attempt < self.retry_attempts
                    {
                        debug!(
                            "retrying {} after HTTP {} (attempt {}/{})",
                            url, status, attempt, self.retry_attempts
                        );
                        sleep(delay).await;
                        delay *= 2;
                        attempt += 1;
                        continue;
                    }
                    if !status.is_success() {
                        return Err(FetchError::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    return Ok(response);
                }
                Err(source) => {
                    if attempt < self.retry_attempts {
                        debug!(
                            "retrying {} after transport error (attempt {}/{}): {}",
                            url, attempt, self.retry_attempts, source
                        );
                        sleep(delay).await;
                        delay *= 2;
                        attempt += 1;
                        continue;
                    }
                    return Err(FetchError::from_reqwest(url, source));
                }
            }
        }
    }
}
