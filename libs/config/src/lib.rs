//! # Network Configuration
//!
//! Resolves a network name to the deployment endpoints the pool SDK needs:
//! RPC node, factory and token addresses, metadata cache and provider
//! services.
//!
//! ## Features
//!
//! - **Built-in table**: shipped in `networks.toml`, embedded at compile time
//! - **External overrides**: TOML file plus environment variables layered on
//!   top of the built-in table
//! - **Permissive lookup**: unknown networks resolve to an empty record that
//!   only echoes the requested name
//!
//! ## Usage
//!
//! ```rust
//! use network_config::NetworkTable;
//!
//! let table = NetworkTable::builtin()?;
//! let polygon = table.get_config("polygon");
//! assert_eq!(polygon.chain_id, Some(137));
//!
//! let missing = table.get_config("atlantis");
//! assert!(missing.node_uri.is_none());
//! # Ok::<(), network_config::ConfigError>(())
//! ```

pub mod error;
pub mod networks;

pub use error::ConfigError;
pub use networks::{NetworkConfig, NetworkTable, BUILTIN_NETWORKS};
