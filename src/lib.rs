//! Index-Ripper: a crawler and downloader for HTTP directory listings
//!
//! This crate walks an "index of" style listing page, builds a hierarchical
//! model of the folders and files it discovers, and downloads a selected
//! subset with bounded concurrency, pause/resume, and per-file cancellation.

pub mod config;
pub mod control;
pub mod crawler;
pub mod download;
pub mod events;
pub mod model;
pub mod url;

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for Index-Ripper operations
#[derive(Debug, Error)]
pub enum RipperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid root URL '{url}': {source}")]
    InvalidRootUrl {
        url: String,
        source: ::url::ParseError,
    },

    #[error("Unsupported scheme '{scheme}' in root URL '{url}'")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    #[error("invalid worker count {value}: must be between {min} and {max}")]
    WorkerCount { value: usize, min: usize, max: usize },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors raised while fetching or probing a listing URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("network error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request timeout for {url}")]
    Timeout { url: String },
}

impl FetchError {
    /// Classifies a reqwest error into timeout vs. general transport failure.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Transport { url, source }
        }
    }
}

/// Errors raised during a single file transfer
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("network error downloading {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("timeout downloading {url}")]
    Timeout { url: String },

    #[error("HTTP {status} downloading {url}")]
    Status { url: String, status: u16 },

    #[error("IO error writing to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates a network or timeout error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Creates a filesystem error for the given destination path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// Downloads reuse the fetch path for the initial request, so fetch
// failures carry over one-to-one.
impl From<FetchError> for DownloadError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Status { url, status } => Self::Status { url, status },
            FetchError::Transport { url, source } => Self::Network { url, source },
            FetchError::Timeout { url } => Self::Timeout { url },
        }
    }
}

/// Result type alias for Index-Ripper operations
pub type Result<T> = std::result::Result<T, RipperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use control::{CancelFlag, PauseGate};
pub use crawler::{ScanOutcome, Scanner, StartOutcome};
pub use download::{DownloadRequest, Downloader};
pub use events::{Event, EventSender};
pub use model::{FileNode, FolderNode, TreeModel};
pub use url::{classify_href, normalize_root, LinkKind};
