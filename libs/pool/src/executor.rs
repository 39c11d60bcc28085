//! Contract call executor
//!
//! Every pool operation reduces to one of three shapes: a read-only query, a
//! gas estimate, or a submitted transaction. [`CallExecutor`] owns those
//! shapes so individual operations only describe *which* method to call
//! with *which* arguments:
//!
//! ```text
//! ContractCall ──► encode ──► query ──► decode ──► T
//!                     │
//!                     └──► estimate (fallback limit) ──► gas price × multiplier ──► send ──► receipt
//! ```
//!
//! Failures are logged here once and returned as typed [`PoolError`]s.

use ethers::abi::{Detokenize, Function, Token};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, TransactionReceipt, TransactionRequest, U256};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::abi::PoolAbi;
use crate::chain::ChainClient;
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::units::WEI_DECIMALS;

/// A bound contract method plus its encoded arguments
#[derive(Debug, Clone)]
pub struct ContractCall<'a> {
    pub to: Address,
    pub function: &'a Function,
    pub args: Vec<Token>,
}

impl ContractCall<'_> {
    pub fn method(&self) -> &str {
        &self.function.name
    }

    fn transaction(&self, from: Option<Address>) -> PoolResult<TypedTransaction> {
        let data = self
            .function
            .encode_input(&self.args)
            .map_err(|e| PoolError::Abi(format!("cannot encode '{}': {}", self.method(), e)))?;

        let mut tx = TransactionRequest::new().to(self.to).data(data);
        if let Some(from) = from {
            tx = tx.from(from);
        }
        Ok(tx.into())
    }
}

/// Shared query / estimate / send machinery
pub struct CallExecutor<C> {
    chain: Arc<C>,
    abi: PoolAbi,
    config: PoolConfig,
}

impl<C> Clone for CallExecutor<C> {
    fn clone(&self) -> Self {
        Self {
            chain: Arc::clone(&self.chain),
            abi: self.abi.clone(),
            config: self.config.clone(),
        }
    }
}

impl<C: ChainClient> CallExecutor<C> {
    pub fn new(chain: Arc<C>, abi: PoolAbi, config: PoolConfig) -> Self {
        Self { chain, abi, config }
    }

    pub fn abi(&self) -> &PoolAbi {
        &self.abi
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn chain(&self) -> &Arc<C> {
        &self.chain
    }

    /// Bind a pool method
    pub fn pool_call(
        &self,
        pool: Address,
        method: &str,
        args: Vec<Token>,
    ) -> PoolResult<ContractCall<'_>> {
        Ok(ContractCall {
            to: pool,
            function: self.abi.function(method)?,
            args,
        })
    }

    /// Bind an ERC20 method
    pub fn erc20_call(
        &self,
        token: Address,
        method: &str,
        args: Vec<Token>,
    ) -> PoolResult<ContractCall<'_>> {
        Ok(ContractCall {
            to: token,
            function: self.abi.erc20_function(method)?,
            args,
        })
    }

    /// Read-only call, logging any failure
    pub async fn query<T: Detokenize>(&self, call: ContractCall<'_>) -> PoolResult<T> {
        let to = call.to;
        let method = call.method().to_string();
        self.try_query(call).await.map_err(|e| {
            error!("Query {} on {:#x} failed: {}", method, to, e);
            e
        })
    }

    async fn try_query<T: Detokenize>(&self, call: ContractCall<'_>) -> PoolResult<T> {
        let tx = call.transaction(None)?;
        debug!("eth_call {} on {:#x}", call.method(), call.to);

        let output = self
            .chain
            .call(&tx)
            .await
            .map_err(|e| PoolError::chain(call.method(), e))?;

        let tokens = call
            .function
            .decode_output(&output)
            .map_err(|e| PoolError::Decode {
                method: call.method().to_string(),
                reason: e.to_string(),
            })?;

        T::from_tokens(tokens).map_err(|e| PoolError::Decode {
            method: call.method().to_string(),
            reason: e.to_string(),
        })
    }

    /// Gas estimate for `call` sent by `from`; never fails on the network side
    pub async fn estimate_gas(&self, from: Address, call: &ContractCall<'_>) -> PoolResult<U256> {
        let tx = call.transaction(Some(from))?;
        Ok(self.estimate_or_default(&tx, call.method()).await)
    }

    async fn estimate_or_default(&self, tx: &TypedTransaction, method: &str) -> U256 {
        match self.chain.estimate_gas(tx).await {
            Ok(gas) => {
                debug!("Estimated {} gas for {}", gas, method);
                gas
            }
            Err(e) => {
                warn!(
                    "Gas estimation for {} failed, using default {}: {}",
                    method, self.config.default_gas_limit, e
                );
                U256::from(self.config.default_gas_limit)
            }
        }
    }

    /// Estimate, price and submit `call` from `from`, returning the receipt
    pub async fn send(
        &self,
        from: Address,
        call: ContractCall<'_>,
    ) -> PoolResult<TransactionReceipt> {
        let mut tx = call.transaction(Some(from))?;

        let gas = self.estimate_or_default(&tx, call.method()).await;
        tx.set_gas(gas);

        // Unpriced transactions are filled in by the middleware
        match self.chain.gas_price().await {
            Ok(price) => {
                tx.set_gas_price(self.config.apply_gas_fee_multiplier(price));
            }
            Err(e) => debug!("Gas price lookup failed, leaving unset: {}", e),
        }

        let receipt = self.chain.send_transaction(tx).await.map_err(|e| {
            error!(
                "Transaction {} on {:#x} from {:#x} failed: {}",
                call.method(),
                call.to,
                from,
                e
            );
            PoolError::chain(call.method(), e)
        })?;

        info!(
            "{} on {:#x} mined: 0x{:x}",
            call.method(),
            call.to,
            receipt.transaction_hash
        );
        Ok(receipt)
    }

    /// On-chain `decimals()` of `token`, 18 when the lookup fails
    pub async fn token_decimals(&self, token: Address) -> u8 {
        let lookup = match self.erc20_call(token, "decimals", vec![]) {
            Ok(call) => self.try_query::<U256>(call).await.and_then(|decimals| {
                // uint8 decoding would truncate out-of-range values
                if decimals > U256::from(u8::MAX) {
                    return Err(PoolError::Decode {
                        method: "decimals".to_string(),
                        reason: format!("{} does not fit in uint8", decimals),
                    });
                }
                Ok(decimals.low_u32() as u8)
            }),
            Err(e) => Err(e),
        };

        lookup.unwrap_or_else(|e| {
            warn!(
                "decimals() lookup for {:#x} failed, assuming {}: {}",
                token, WEI_DECIMALS, e
            );
            WEI_DECIMALS
        })
    }

    /// Caller-supplied decimals, or the on-chain value
    pub async fn resolve_decimals(&self, token: Address, known: Option<u8>) -> u8 {
        match known {
            Some(decimals) => decimals,
            None => self.token_decimals(token).await,
        }
    }
}
