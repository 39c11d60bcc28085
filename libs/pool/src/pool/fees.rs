//! Fee configuration and collection

use ethers::abi::Token;
use ethers::types::{Address, TransactionReceipt, U256};

use super::Pool;
use crate::chain::ChainClient;
use crate::error::{PoolError, PoolResult};
use crate::executor::ContractCall;
use crate::units::to_wei;

impl<C: ChainClient> Pool<C> {
    /// Reject `caller` unless it is the pool's publish market fee collector
    async fn ensure_market_fee_collector(&self, caller: Address, pool: Address) -> PoolResult<()> {
        let collector = self.get_market_fee_collector(pool).await?;
        if collector != caller {
            return Err(PoolError::NotMarketFeeCollector { caller, collector });
        }
        Ok(())
    }

    fn set_swap_fee_call(&self, pool: Address, fee: &str) -> PoolResult<ContractCall<'_>> {
        self.exec
            .pool_call(pool, "setSwapFee", vec![Token::Uint(to_wei(fee)?)])
    }

    fn update_publish_market_fee_call(
        &self,
        pool: Address,
        new_collector: Address,
        new_fee: &str,
    ) -> PoolResult<ContractCall<'_>> {
        self.exec.pool_call(
            pool,
            "updatePublishMarketFee",
            vec![Token::Address(new_collector), Token::Uint(to_wei(new_fee)?)],
        )
    }

    pub async fn est_set_swap_fee(&self, caller: Address, pool: Address, fee: &str) -> PoolResult<U256> {
        let call = self.set_swap_fee_call(pool, fee)?;
        self.exec.estimate_gas(caller, &call).await
    }

    /// Set the liquidity provider swap fee; `fee` is a fraction, e.g. "0.001"
    pub async fn set_swap_fee(
        &self,
        caller: Address,
        pool: Address,
        fee: &str,
    ) -> PoolResult<TransactionReceipt> {
        let call = self.set_swap_fee_call(pool, fee)?;
        self.exec.send(caller, call).await
    }

    pub async fn est_collect_opc(&self, caller: Address, pool: Address) -> PoolResult<U256> {
        let call = self.exec.pool_call(pool, "collectOPC", vec![])?;
        self.exec.estimate_gas(caller, &call).await
    }

    /// Send accrued community fees to the OPC collector
    pub async fn collect_opc(&self, caller: Address, pool: Address) -> PoolResult<TransactionReceipt> {
        let call = self.exec.pool_call(pool, "collectOPC", vec![])?;
        self.exec.send(caller, call).await
    }

    pub async fn est_collect_market_fee(&self, caller: Address, pool: Address) -> PoolResult<U256> {
        let call = self.exec.pool_call(pool, "collectMarketFee", vec![])?;
        self.exec.estimate_gas(caller, &call).await
    }

    /// Send accrued publish market fees to the collector. Only the
    /// collector may call this.
    pub async fn collect_market_fee(
        &self,
        caller: Address,
        pool: Address,
    ) -> PoolResult<TransactionReceipt> {
        self.ensure_market_fee_collector(caller, pool).await?;

        let call = self.exec.pool_call(pool, "collectMarketFee", vec![])?;
        self.exec.send(caller, call).await
    }

    pub async fn est_update_publish_market_fee(
        &self,
        caller: Address,
        pool: Address,
        new_collector: Address,
        new_fee: &str,
    ) -> PoolResult<U256> {
        let call = self.update_publish_market_fee_call(pool, new_collector, new_fee)?;
        self.exec.estimate_gas(caller, &call).await
    }

    /// Hand the publish market fee to `new_collector` at rate `new_fee`.
    /// Only the current collector may call this.
    pub async fn update_publish_market_fee(
        &self,
        caller: Address,
        pool: Address,
        new_collector: Address,
        new_fee: &str,
    ) -> PoolResult<TransactionReceipt> {
        self.ensure_market_fee_collector(caller, pool).await?;

        let call = self.update_publish_market_fee_call(pool, new_collector, new_fee)?;
        self.exec.send(caller, call).await
    }
}
