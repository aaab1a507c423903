use serde::Deserialize;

/// Browser user agent sent with every request. Listing servers routinely
/// serve different markup (or a 403) to obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for Index-Ripper
///
/// Every section and field has a default, so an empty TOML document is a
/// valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub download: DownloadConfig,
}

/// HTTP client behavior
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User agent header value
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// TCP connect timeout in seconds
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Total deadline for listing page requests, in seconds
    #[serde(rename = "read-timeout-secs", default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    /// Total deadline for file probes, in seconds
    #[serde(rename = "probe-timeout-secs", default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Attempts per request before giving up
    #[serde(rename = "retry-attempts", default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// First retry delay in milliseconds; doubles per attempt
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,
}

/// Scan worker pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    /// Number of concurrent listing entry processors
    #[serde(default = "default_scan_workers")]
    pub workers: usize,
}

/// Download worker pool configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    /// Number of concurrent file transfers
    #[serde(default = "default_download_workers")]
    pub workers: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            probe_timeout_secs: default_probe_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff(),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: default_scan_workers(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: default_download_workers(),
        }
    }
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_read_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    100
}

fn default_scan_workers() -> usize {
    10
}

fn default_download_workers() -> usize {
    crate::download::DEFAULT_WORKERS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.http.read_timeout_secs, 30);
        assert_eq!(config.http.probe_timeout_secs, 10);
        assert_eq!(config.http.retry_attempts, 3);
        assert_eq!(config.http.retry_backoff_ms, 100);
        assert_eq!(config.scan.workers, 10);
        assert_eq!(config.download.workers, 5);
        assert!(config.http.user_agent.starts_with("Mozilla/5.0"));
    }
}
