use crate::config::types::{Config, DownloadConfig, HttpConfig, ScanConfig};
use crate::download::{MAX_WORKERS, MIN_WORKERS};
use crate::ConfigError;

/// Bounds for the scan worker pool.
const SCAN_WORKERS_MIN: usize = 1;
const SCAN_WORKERS_MAX: usize = 64;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_scan_config(&config.scan)?;
    validate_download_config(&config.download)?;
    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.read_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "read-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.probe_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "probe-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.retry_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry-attempts must be >= 1, got {}",
            config.retry_attempts
        )));
    }

    Ok(())
}

/// Validates the scan worker pool size
fn validate_scan_config(config: &ScanConfig) -> Result<(), ConfigError> {
    if config.workers < SCAN_WORKERS_MIN || config.workers > SCAN_WORKERS_MAX {
        return Err(ConfigError::Validation(format!(
            "scan workers must be between {} and {}, got {}",
            SCAN_WORKERS_MIN, SCAN_WORKERS_MAX, config.workers
        )));
    }
    Ok(())
}

/// Validates the download worker pool size
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    if config.workers < MIN_WORKERS || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "download workers must be between {} and {}, got {}",
            MIN_WORKERS, MAX_WORKERS, config.workers
        )));
    }
    Ok(())
}
