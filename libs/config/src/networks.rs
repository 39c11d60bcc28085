//! Network Table Module
//!
//! Maps a network name to its deployment record. The built-in table is
//! compiled into the crate; operators can layer a TOML file and environment
//! variables on top of it without a code change.

use config_crate::{Config, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::ConfigError;

/// Built-in network table in TOML form
pub const BUILTIN_NETWORKS: &str = include_str!("../networks.toml");

/// Deployment record for a single network
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct NetworkConfig {
    /// Network name; always set, even for unknown networks
    #[serde(default)]
    pub network: String,

    pub chain_id: Option<u64>,
    pub node_uri: Option<String>,
    pub factory_address: Option<String>,

    /// Governance / base token deployed on this network
    pub token_address: Option<String>,

    pub metadata_cache_uri: Option<String>,
    pub provider_uri: Option<String>,

    /// Multiplier applied to the suggested gas price when sending transactions
    pub gas_fee_multiplier: Option<Decimal>,
}

impl NetworkConfig {
    /// Record for a network missing from the table: only the name is set
    pub fn unknown(network: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            ..Default::default()
        }
    }

    /// True when the record came from a table entry rather than a miss
    pub fn is_known(&self) -> bool {
        self.chain_id.is_some()
            || self.node_uri.is_some()
            || self.factory_address.is_some()
            || self.token_address.is_some()
            || self.metadata_cache_uri.is_some()
            || self.provider_uri.is_some()
    }
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    networks: BTreeMap<String, NetworkConfig>,
}

/// Immutable lookup table keyed by network name
#[derive(Debug, Clone, Default)]
pub struct NetworkTable {
    networks: BTreeMap<String, NetworkConfig>,
}

impl NetworkTable {
    /// Table shipped with the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_NETWORKS)
    }

    /// Parse a table from TOML text with `[networks.<name>]` sections
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let raw: RawTable = toml::from_str(text)?;
        Ok(Self::from_raw(raw))
    }

    /// Load the built-in table, then an optional override file, then
    /// environment overrides.
    ///
    /// Environment keys use `<PREFIX>__NETWORKS__<NAME>__<FIELD>`, for
    /// example `POOL_SDK__NETWORKS__MAINNET__NODE_URI`.
    pub fn load(path: Option<&Path>, env_prefix: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder =
            Config::builder().add_source(File::from_str(BUILTIN_NETWORKS, FileFormat::Toml));

        if let Some(path) = path {
            info!("Loading network overrides: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        if let Some(prefix) = env_prefix {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let raw: RawTable = builder.build()?.try_deserialize()?;
        let table = Self::from_raw(raw);
        debug!("Loaded {} networks", table.networks.len());
        Ok(table)
    }

    fn from_raw(raw: RawTable) -> Self {
        let networks = raw
            .networks
            .into_iter()
            .map(|(name, mut entry)| {
                entry.network = name.clone();
                (name, entry)
            })
            .collect();
        Self { networks }
    }

    /// Exact-name lookup; a miss yields [`NetworkConfig::unknown`]
    pub fn get_config(&self, network: &str) -> NetworkConfig {
        match self.networks.get(network) {
            Some(config) => config.clone(),
            None => {
                debug!("No configuration for network '{}'", network);
                NetworkConfig::unknown(network)
            }
        }
    }

    /// Lookup by chain id; a miss echoes the id as the network name
    pub fn get_config_by_chain_id(&self, chain_id: u64) -> NetworkConfig {
        self.networks
            .values()
            .find(|config| config.chain_id == Some(chain_id))
            .cloned()
            .unwrap_or_else(|| NetworkConfig::unknown(chain_id.to_string()))
    }

    /// Lookup that appends a hosted-RPC project id to Infura node URIs
    pub fn get_config_with_project_id(&self, network: &str, project_id: &str) -> NetworkConfig {
        let mut config = self.get_config(network);
        if let Some(uri) = config.node_uri.as_mut() {
            if uri.contains("infura.io") {
                uri.push('/');
                uri.push_str(project_id);
            }
        }
        config
    }

    /// Known network names, sorted
    pub fn network_names(&self) -> Vec<&str> {
        self.networks.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}
