use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Any table or key missing from the file falls back to its default, so a
/// partial file is enough to override just one setting.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use index_ripper::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Download workers: {}", config.download.workers);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    // Read the configuration file
    let content = std::fs::read_to_string(path)?;

    // Parse TOML
    let config: Config = toml::from_str(&content)?;

    // Validate the configuration
    validate(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[http]
user-agent = "TestAgent/1.0"
connect-timeout-secs = 5
read-timeout-secs = 20
probe-timeout-secs = 8
retry-attempts = 2
retry-backoff-ms = 50

[scan]
workers = 4

[download]
workers = 3
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.http.user_agent, "TestAgent/1.0");
        assert_eq!(config.http.connect_timeout_secs, 5);
        assert_eq!(config.http.read_timeout_secs, 20);
        assert_eq!(config.http.retry_attempts, 2);
        assert_eq!(config.scan.workers, 4);
        assert_eq!(config.download.workers, 3);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let config_content = r#"
[download]
workers = 2
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.download.workers, 2);
        assert_eq!(config.scan.workers, 10);
        assert_eq!(config.http.read_timeout_secs, 30);
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.http.user_agent, Config::default().http.user_agent);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[download]
workers = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }
}
