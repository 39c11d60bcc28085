//! Contract ABI descriptions
//!
//! The pool ABI ships as JSON in `abi/BPool.json` and is embedded at compile
//! time; callers with a different build of the pool contract inject their
//! own through [`PoolAbi::from_json`]. Token decimals are read through a
//! minimal ERC20 ABI.

use ethers::abi::{Abi, Event, Function};
use std::sync::Arc;

use crate::error::{PoolError, PoolResult};

/// Two-token weighted pool ABI
pub const POOL_ABI_JSON: &str = include_str!("../abi/BPool.json");

/// ERC20 subset used for `decimals()` and `balanceOf()`
pub const ERC20_ABI_JSON: &str = include_str!("../abi/ERC20.json");

/// Parsed pool and token ABIs, cheap to clone
#[derive(Debug, Clone)]
pub struct PoolAbi {
    pool: Arc<Abi>,
    erc20: Arc<Abi>,
}

impl PoolAbi {
    /// Embedded pool ABI
    pub fn load() -> PoolResult<Self> {
        Self::from_json(POOL_ABI_JSON)
    }

    /// Pool ABI from JSON text; the ERC20 ABI is always the embedded one
    pub fn from_json(pool_json: &str) -> PoolResult<Self> {
        let pool: Abi = serde_json::from_str(pool_json)
            .map_err(|e| PoolError::Abi(format!("pool ABI: {}", e)))?;
        let erc20: Abi = serde_json::from_str(ERC20_ABI_JSON)
            .map_err(|e| PoolError::Abi(format!("ERC20 ABI: {}", e)))?;

        Ok(Self {
            pool: Arc::new(pool),
            erc20: Arc::new(erc20),
        })
    }

    pub fn pool(&self) -> &Abi {
        &self.pool
    }

    /// Pool function by name
    pub fn function(&self, name: &str) -> PoolResult<&Function> {
        self.pool
            .function(name)
            .map_err(|_| PoolError::UnknownFunction(name.to_string()))
    }

    /// ERC20 function by name
    pub fn erc20_function(&self, name: &str) -> PoolResult<&Function> {
        self.erc20
            .function(name)
            .map_err(|_| PoolError::UnknownFunction(name.to_string()))
    }

    /// Pool event by name
    pub fn event(&self, name: &str) -> PoolResult<&Event> {
        self.pool
            .event(name)
            .map_err(|_| PoolError::UnknownEvent(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every contract method the client calls
    const CLIENT_METHODS: &[&str] = &[
        "balanceOf",
        "totalSupply",
        "getNumTokens",
        "getCurrentTokens",
        "getFinalTokens",
        "getController",
        "getBaseTokenAddress",
        "getDatatokenAddress",
        "_publishMarketCollector",
        "_opcCollector",
        "isBound",
        "isFinalized",
        "getBalance",
        "getSwapFee",
        "getMarketFee",
        "getOPCFee",
        "getNormalizedWeight",
        "getDenormalizedWeight",
        "getTotalDenormalizedWeight",
        "publishMarketFees",
        "communityFees",
        "getCurrentMarketFees",
        "getCurrentOPCFees",
        "getSpotPrice",
        "getAmountInExactOut",
        "getAmountOutExactIn",
        "calcPoolOutSingleIn",
        "calcSingleInPoolOut",
        "calcSingleOutPoolIn",
        "calcPoolInSingleOut",
        "setSwapFee",
        "collectOPC",
        "collectMarketFee",
        "updatePublishMarketFee",
        "swapExactAmountIn",
        "swapExactAmountOut",
        "joinPool",
        "exitPool",
        "joinswapExternAmountIn",
        "exitswapPoolAmountIn",
    ];

    #[test]
    fn test_embedded_abi_covers_client_methods() {
        let abi = PoolAbi::load().unwrap();
        for method in CLIENT_METHODS {
            assert!(abi.function(method).is_ok(), "missing {}", method);
        }
        assert!(abi.erc20_function("decimals").is_ok());
    }

    #[test]
    fn test_swap_takes_fixed_arrays() {
        let abi = PoolAbi::load().unwrap();
        let swap = abi.function("swapExactAmountIn").unwrap();
        assert_eq!(
            swap.signature(),
            "swapExactAmountIn(address[3],uint256[4]):(uint256,uint256)"
        );
    }

    #[test]
    fn test_unknown_names_are_errors() {
        let abi = PoolAbi::load().unwrap();
        assert!(matches!(
            abi.function("rugPull"),
            Err(PoolError::UnknownFunction(name)) if name == "rugPull"
        ));
        assert!(matches!(abi.event("LOG_CALL"), Err(PoolError::UnknownEvent(_))));
    }

    #[test]
    fn test_injected_abi() {
        let json = r#"[{"type":"function","name":"getSwapFee","inputs":[],"outputs":[{"name":"","type":"uint256"}],"stateMutability":"view"}]"#;
        let abi = PoolAbi::from_json(json).unwrap();
        assert!(abi.function("getSwapFee").is_ok());
        assert!(abi.function("joinPool").is_err());

        assert!(matches!(PoolAbi::from_json("{not json"), Err(PoolError::Abi(_))));
    }
}
