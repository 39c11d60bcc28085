//! Error types for network configuration loading

use thiserror::Error;

/// Failure to build a network table.
///
/// Lookups never fail; only parsing or loading a table does.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML text could not be parsed into a network table
    #[error("Failed to parse network table: {0}")]
    Parse(#[from] toml::de::Error),

    /// Layered loading (file or environment) failed
    #[error("Failed to load network table: {0}")]
    Load(#[from] config_crate::ConfigError),
}
