//! Request and response types for pool operations
//!
//! Amounts are human-readable decimal strings; addresses are typed.

use ethers::types::Address;
use serde::{Deserialize, Serialize};

/// Fees accrued in the pool and not yet collected
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CurrentFees {
    pub tokens: Vec<Address>,
    /// Amounts in each token's own units, positionally matching `tokens`
    pub amounts: Vec<String>,
}

/// Trade quote split into principal and itemized fees
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PoolPriceAndFees {
    /// Amount in for exact-out quotes, amount out for exact-in quotes
    pub token_amount: String,
    pub liquidity_provider_swap_fee_amount: String,
    /// Protocol community fee
    pub opc_fee_amount: String,
    pub publish_market_swap_fee_amount: String,
    pub consume_market_swap_fee_amount: String,
}

/// Token pair and fee recipient of a swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInOutMarket {
    pub token_in: Address,
    pub token_out: Address,
    /// Receives the consume market swap fee
    pub market_fee_address: Address,
    /// Skip the `decimals()` lookup when known
    pub token_in_decimals: Option<u8>,
    pub token_out_decimals: Option<u8>,
}

impl TokenInOutMarket {
    pub fn new(token_in: Address, token_out: Address, market_fee_address: Address) -> Self {
        Self {
            token_in,
            token_out,
            market_fee_address,
            token_in_decimals: None,
            token_out_decimals: None,
        }
    }

    pub fn with_decimals(mut self, token_in: u8, token_out: u8) -> Self {
        self.token_in_decimals = Some(token_in);
        self.token_out_decimals = Some(token_out);
        self
    }
}

/// Amounts for a swap with a fixed input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountsInMaxFee {
    pub token_amount_in: String,
    pub min_amount_out: String,
    /// Upper bound on the spot price after the swap; `None` means unbounded
    pub max_price: Option<String>,
    /// Consume market fee as a fraction, e.g. "0.001"
    pub swap_market_fee: String,
}

/// Amounts for a swap with a fixed output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountsOutMaxFee {
    pub max_amount_in: String,
    pub token_amount_out: String,
    /// Upper bound on the spot price after the swap; `None` means unbounded
    pub max_price: Option<String>,
    /// Consume market fee as a fraction, e.g. "0.001"
    pub swap_market_fee: String,
}
