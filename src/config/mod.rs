//! Configuration module for Index Ripper
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; missing values fall back to built-in defaults.
//!
//! # Example
//!
//! ```no_run
//! use index_ripper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Scan will use {} workers", config.scan.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, DownloadConfig, HttpConfig, ScanConfig, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::load_config;

// Re-export validation
pub use validation::validate;
