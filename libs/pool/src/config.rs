//! Configuration for the pool client

use ethers::types::U256;
use network_config::NetworkConfig;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Gas limit used whenever estimation fails
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Fallback gas limit when `eth_estimateGas` fails
    pub default_gas_limit: u64,

    /// Multiplier applied to the node's suggested gas price; values at or
    /// below 1 leave the price untouched
    pub gas_fee_multiplier: Decimal,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            default_gas_limit: DEFAULT_GAS_LIMIT,
            gas_fee_multiplier: Decimal::ONE,
        }
    }
}

impl PoolConfig {
    /// Defaults, with the network's gas fee multiplier when it has one
    pub fn from_network(network: &NetworkConfig) -> Self {
        Self {
            gas_fee_multiplier: network.gas_fee_multiplier.unwrap_or(Decimal::ONE),
            ..Default::default()
        }
    }

    /// Scale a suggested gas price by the configured multiplier; a price
    /// too large to scale is returned unchanged
    pub fn apply_gas_fee_multiplier(&self, gas_price: U256) -> U256 {
        let multiplier = self.gas_fee_multiplier.normalize();
        if multiplier <= Decimal::ONE {
            return gas_price;
        }

        let mantissa = multiplier.mantissa().unsigned_abs();
        let divisor = U256::exp10(multiplier.scale() as usize);
        match gas_price.checked_mul(U256::from(mantissa)) {
            Some(scaled) => scaled / divisor,
            None => {
                warn!(
                    "Gas price {} overflows multiplier {}, leaving it unscaled",
                    gas_price, multiplier
                );
                gas_price
            }
        }
    }
}
