//! Adding and removing liquidity

use ethers::abi::Token;
use ethers::types::{Address, TransactionReceipt, U256};

use super::{ensure_within, Pool, MAX_IN_RATIO_DIVISOR, MAX_OUT_RATIO_DIVISOR, POOL_TOKEN_COUNT};
use crate::chain::ChainClient;
use crate::error::{PoolError, PoolResult};
use crate::executor::ContractCall;
use crate::units::{amount_to_units, to_wei};

impl<C: ChainClient> Pool<C> {
    /// Convert one amount per pool token, matched by position against
    /// `getFinalTokens`
    async fn amounts_by_position<S: AsRef<str>>(
        &self,
        pool: Address,
        amounts: &[S],
    ) -> PoolResult<Token> {
        let tokens = self.get_final_tokens(pool).await?;
        if tokens.len() != POOL_TOKEN_COUNT {
            return Err(PoolError::UnexpectedTokenCount {
                expected: POOL_TOKEN_COUNT,
                found: tokens.len(),
            });
        }
        if amounts.len() != POOL_TOKEN_COUNT {
            return Err(PoolError::UnexpectedTokenCount {
                expected: POOL_TOKEN_COUNT,
                found: amounts.len(),
            });
        }

        let mut units = Vec::with_capacity(POOL_TOKEN_COUNT);
        for (token, amount) in tokens.iter().zip(amounts) {
            let decimals = self.exec.token_decimals(*token).await;
            units.push(Token::Uint(amount_to_units(amount.as_ref(), decimals)?));
        }
        Ok(Token::Array(units))
    }

    async fn join_pool_call<S: AsRef<str>>(
        &self,
        pool: Address,
        pool_amount_out: &str,
        max_amounts_in: &[S],
    ) -> PoolResult<ContractCall<'_>> {
        let max_amounts_in = self.amounts_by_position(pool, max_amounts_in).await?;
        self.exec.pool_call(
            pool,
            "joinPool",
            vec![Token::Uint(to_wei(pool_amount_out)?), max_amounts_in],
        )
    }

    async fn exit_pool_call<S: AsRef<str>>(
        &self,
        pool: Address,
        pool_amount_in: &str,
        min_amounts_out: &[S],
    ) -> PoolResult<ContractCall<'_>> {
        let min_amounts_out = self.amounts_by_position(pool, min_amounts_out).await?;
        self.exec.pool_call(
            pool,
            "exitPool",
            vec![Token::Uint(to_wei(pool_amount_in)?), min_amounts_out],
        )
    }

    pub async fn est_join_pool<S: AsRef<str>>(
        &self,
        caller: Address,
        pool: Address,
        pool_amount_out: &str,
        max_amounts_in: &[S],
    ) -> PoolResult<U256> {
        let call = self.join_pool_call(pool, pool_amount_out, max_amounts_in).await?;
        self.exec.estimate_gas(caller, &call).await
    }

    /// Mint exactly `pool_amount_out` shares, spending at most
    /// `max_amounts_in` of each pool token
    pub async fn join_pool<S: AsRef<str>>(
        &self,
        caller: Address,
        pool: Address,
        pool_amount_out: &str,
        max_amounts_in: &[S],
    ) -> PoolResult<TransactionReceipt> {
        let call = self.join_pool_call(pool, pool_amount_out, max_amounts_in).await?;
        self.exec.send(caller, call).await
    }

    pub async fn est_exit_pool<S: AsRef<str>>(
        &self,
        caller: Address,
        pool: Address,
        pool_amount_in: &str,
        min_amounts_out: &[S],
    ) -> PoolResult<U256> {
        let call = self.exit_pool_call(pool, pool_amount_in, min_amounts_out).await?;
        self.exec.estimate_gas(caller, &call).await
    }

    /// Burn exactly `pool_amount_in` shares, receiving at least
    /// `min_amounts_out` of each pool token
    pub async fn exit_pool<S: AsRef<str>>(
        &self,
        caller: Address,
        pool: Address,
        pool_amount_in: &str,
        min_amounts_out: &[S],
    ) -> PoolResult<TransactionReceipt> {
        let call = self.exit_pool_call(pool, pool_amount_in, min_amounts_out).await?;
        self.exec.send(caller, call).await
    }

    async fn joinswap_extern_amount_in_call(
        &self,
        pool: Address,
        token_amount_in: &str,
        min_pool_amount_out: &str,
    ) -> PoolResult<(ContractCall<'_>, Address, U256, u8)> {
        let base_token = self.get_base_token(pool).await?;
        let decimals = self.exec.token_decimals(base_token).await;
        let amount_in = amount_to_units(token_amount_in, decimals)?;

        let call = self.exec.pool_call(
            pool,
            "joinswapExternAmountIn",
            vec![Token::Uint(amount_in), Token::Uint(to_wei(min_pool_amount_out)?)],
        )?;
        Ok((call, base_token, amount_in, decimals))
    }

    async fn exitswap_pool_amount_in_call(
        &self,
        pool: Address,
        pool_amount_in: &str,
        min_token_amount_out: &str,
    ) -> PoolResult<(ContractCall<'_>, Address, U256, u8)> {
        let base_token = self.get_base_token(pool).await?;
        let decimals = self.exec.token_decimals(base_token).await;
        let min_out = amount_to_units(min_token_amount_out, decimals)?;

        let call = self.exec.pool_call(
            pool,
            "exitswapPoolAmountIn",
            vec![Token::Uint(to_wei(pool_amount_in)?), Token::Uint(min_out)],
        )?;
        Ok((call, base_token, min_out, decimals))
    }

    pub async fn est_joinswap_extern_amount_in(
        &self,
        caller: Address,
        pool: Address,
        token_amount_in: &str,
        min_pool_amount_out: &str,
    ) -> PoolResult<U256> {
        let (call, ..) = self
            .joinswap_extern_amount_in_call(pool, token_amount_in, min_pool_amount_out)
            .await?;
        self.exec.estimate_gas(caller, &call).await
    }

    /// Deposit `token_amount_in` of the base token alone for at least
    /// `min_pool_amount_out` shares
    pub async fn joinswap_extern_amount_in(
        &self,
        caller: Address,
        pool: Address,
        token_amount_in: &str,
        min_pool_amount_out: &str,
    ) -> PoolResult<TransactionReceipt> {
        let (call, base_token, amount_in, decimals) = self
            .joinswap_extern_amount_in_call(pool, token_amount_in, min_pool_amount_out)
            .await?;

        let max_in = self
            .max_ratio_units(pool, base_token, MAX_IN_RATIO_DIVISOR)
            .await?;
        ensure_within("tokenAmountIn", amount_in, max_in, decimals)?;

        self.exec.send(caller, call).await
    }

    pub async fn est_exitswap_pool_amount_in(
        &self,
        caller: Address,
        pool: Address,
        pool_amount_in: &str,
        min_token_amount_out: &str,
    ) -> PoolResult<U256> {
        let (call, ..) = self
            .exitswap_pool_amount_in_call(pool, pool_amount_in, min_token_amount_out)
            .await?;
        self.exec.estimate_gas(caller, &call).await
    }

    /// Burn `pool_amount_in` shares for at least `min_token_amount_out` of
    /// the base token
    pub async fn exitswap_pool_amount_in(
        &self,
        caller: Address,
        pool: Address,
        pool_amount_in: &str,
        min_token_amount_out: &str,
    ) -> PoolResult<TransactionReceipt> {
        let (call, base_token, min_out, decimals) = self
            .exitswap_pool_amount_in_call(pool, pool_amount_in, min_token_amount_out)
            .await?;

        let max_out = self
            .max_ratio_units(pool, base_token, MAX_OUT_RATIO_DIVISOR)
            .await?;
        ensure_within("tokenAmountOut", min_out, max_out, decimals)?;

        self.exec.send(caller, call).await
    }
}
