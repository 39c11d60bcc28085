//! Error types for pool client operations

use ethers::types::{Address, H256};
use thiserror::Error;

use crate::units::UnitsError;

/// Result type alias for pool operations
pub type PoolResult<T> = std::result::Result<T, PoolError>;

/// Failure reported by the injected chain connection
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC transport or node rejected the request (includes reverts)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Transaction was submitted but never produced a receipt
    #[error("Transaction 0x{0:x} dropped before a receipt was available")]
    Dropped(H256),
}

/// Main error type for pool operations
#[derive(Debug, Error)]
pub enum PoolError {
    /// Contract call, estimation or submission failed on the network
    #[error("Contract call '{method}' failed: {source}")]
    Chain {
        /// Contract method being called
        method: String,
        /// Underlying chain failure
        #[source]
        source: ChainError,
    },

    /// Returned data did not match the ABI output shape
    #[error("Failed to decode output of '{method}': {reason}")]
    Decode {
        /// Contract method whose output was decoded
        method: String,
        /// Decoder message
        reason: String,
    },

    /// A human-readable amount could not be converted to base units
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] UnitsError),

    /// Caller is not the on-chain publish market fee collector
    #[error("Caller {caller:#x} is not the market fee collector {collector:#x}")]
    NotMarketFeeCollector {
        /// Address that attempted the operation
        caller: Address,
        /// Collector recorded by the pool
        collector: Address,
    },

    /// Requested amount is above the pool's ratio limit for the token reserve
    #[error("{field} {requested} is greater than {max}")]
    ExceedsMaxRatio {
        /// Parameter that was checked
        field: &'static str,
        /// Requested human amount
        requested: String,
        /// Largest accepted human amount
        max: String,
    },

    /// Pool does not hold the number of tokens the operation expects
    #[error("Expected {expected} pool tokens, found {found}")]
    UnexpectedTokenCount {
        /// Token count the operation works with
        expected: usize,
        /// Token count supplied or reported
        found: usize,
    },

    /// ABI description could not be loaded
    #[error("Invalid ABI: {0}")]
    Abi(String),

    /// ABI has no function with this name
    #[error("Function '{0}' not found in ABI")]
    UnknownFunction(String),

    /// ABI has no event with this name
    #[error("Event '{0}' not found in ABI")]
    UnknownEvent(String),
}

impl PoolError {
    pub(crate) fn chain(method: &str, source: ChainError) -> Self {
        PoolError::Chain {
            method: method.to_string(),
            source,
        }
    }

    /// True when the failure came from the network rather than the caller's input
    pub fn is_chain_failure(&self) -> bool {
        matches!(self, PoolError::Chain { .. } | PoolError::Decode { .. })
    }

    /// True when the client refused the call because the caller lacks the role
    pub fn is_authorization(&self) -> bool {
        matches!(self, PoolError::NotMarketFeeCollector { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let chain = PoolError::chain("getBalance", ChainError::Provider("timeout".into()));
        assert!(chain.is_chain_failure());
        assert!(!chain.is_authorization());

        let auth = PoolError::NotMarketFeeCollector {
            caller: Address::repeat_byte(0x01),
            collector: Address::repeat_byte(0x02),
        };
        assert!(auth.is_authorization());
        assert!(!auth.is_chain_failure());

        let amount = PoolError::from(UnitsError::Empty);
        assert!(!amount.is_chain_failure());
    }

    #[test]
    fn test_messages_name_the_method() {
        let err = PoolError::chain("collectOPC", ChainError::Provider("reverted".into()));
        assert_eq!(
            err.to_string(),
            "Contract call 'collectOPC' failed: Provider error: reverted"
        );

        let limit = PoolError::ExceedsMaxRatio {
            field: "tokenAmountIn",
            requested: "600".into(),
            max: "500".into(),
        };
        assert_eq!(limit.to_string(), "tokenAmountIn 600 is greater than 500");
    }
}
