//! Swaps against the pool

use ethers::abi::Token;
use ethers::types::{Address, TransactionReceipt, U256};

use super::{ensure_within, Pool, MAX_IN_RATIO_DIVISOR, MAX_OUT_RATIO_DIVISOR};
use crate::chain::ChainClient;
use crate::error::PoolResult;
use crate::executor::ContractCall;
use crate::types::{AmountsInMaxFee, AmountsOutMaxFee, TokenInOutMarket};
use crate::units::{amount_to_units, to_wei};

/// Spot price bound; unset means no bound
fn max_price_units(max_price: Option<&str>) -> PoolResult<U256> {
    match max_price {
        Some(price) => Ok(to_wei(price)?),
        None => Ok(U256::MAX),
    }
}

fn token_in_out_market(tokens: &TokenInOutMarket) -> Token {
    Token::FixedArray(vec![
        Token::Address(tokens.token_in),
        Token::Address(tokens.token_out),
        Token::Address(tokens.market_fee_address),
    ])
}

fn amounts_array(amounts: [U256; 4]) -> Token {
    Token::FixedArray(amounts.into_iter().map(Token::Uint).collect())
}

impl<C: ChainClient> Pool<C> {
    async fn swap_exact_amount_in_call(
        &self,
        pool: Address,
        tokens: &TokenInOutMarket,
        amounts: &AmountsInMaxFee,
    ) -> PoolResult<(ContractCall<'_>, U256, u8)> {
        let decimals_in = self
            .exec
            .resolve_decimals(tokens.token_in, tokens.token_in_decimals)
            .await;
        let decimals_out = self
            .exec
            .resolve_decimals(tokens.token_out, tokens.token_out_decimals)
            .await;

        let amount_in = amount_to_units(&amounts.token_amount_in, decimals_in)?;
        let args = vec![
            token_in_out_market(tokens),
            amounts_array([
                amount_in,
                amount_to_units(&amounts.min_amount_out, decimals_out)?,
                max_price_units(amounts.max_price.as_deref())?,
                to_wei(&amounts.swap_market_fee)?,
            ]),
        ];

        let call = self.exec.pool_call(pool, "swapExactAmountIn", args)?;
        Ok((call, amount_in, decimals_in))
    }

    async fn swap_exact_amount_out_call(
        &self,
        pool: Address,
        tokens: &TokenInOutMarket,
        amounts: &AmountsOutMaxFee,
    ) -> PoolResult<(ContractCall<'_>, U256, u8)> {
        let decimals_in = self
            .exec
            .resolve_decimals(tokens.token_in, tokens.token_in_decimals)
            .await;
        let decimals_out = self
            .exec
            .resolve_decimals(tokens.token_out, tokens.token_out_decimals)
            .await;

        let amount_out = amount_to_units(&amounts.token_amount_out, decimals_out)?;
        let args = vec![
            token_in_out_market(tokens),
            amounts_array([
                amount_to_units(&amounts.max_amount_in, decimals_in)?,
                amount_out,
                max_price_units(amounts.max_price.as_deref())?,
                to_wei(&amounts.swap_market_fee)?,
            ]),
        ];

        let call = self.exec.pool_call(pool, "swapExactAmountOut", args)?;
        Ok((call, amount_out, decimals_out))
    }

    pub async fn est_swap_exact_amount_in(
        &self,
        caller: Address,
        pool: Address,
        tokens: &TokenInOutMarket,
        amounts: &AmountsInMaxFee,
    ) -> PoolResult<U256> {
        let (call, _, _) = self.swap_exact_amount_in_call(pool, tokens, amounts).await?;
        self.exec.estimate_gas(caller, &call).await
    }

    /// Sell exactly `token_amount_in` of `token_in` for at least `min_amount_out`
    pub async fn swap_exact_amount_in(
        &self,
        caller: Address,
        pool: Address,
        tokens: &TokenInOutMarket,
        amounts: &AmountsInMaxFee,
    ) -> PoolResult<TransactionReceipt> {
        let (call, amount_in, decimals_in) =
            self.swap_exact_amount_in_call(pool, tokens, amounts).await?;

        let max_in = self
            .max_ratio_units(pool, tokens.token_in, MAX_IN_RATIO_DIVISOR)
            .await?;
        ensure_within("tokenAmountIn", amount_in, max_in, decimals_in)?;

        self.exec.send(caller, call).await
    }

    pub async fn est_swap_exact_amount_out(
        &self,
        caller: Address,
        pool: Address,
        tokens: &TokenInOutMarket,
        amounts: &AmountsOutMaxFee,
    ) -> PoolResult<U256> {
        let (call, _, _) = self.swap_exact_amount_out_call(pool, tokens, amounts).await?;
        self.exec.estimate_gas(caller, &call).await
    }

    /// Buy exactly `token_amount_out` of `token_out` for at most `max_amount_in`
    pub async fn swap_exact_amount_out(
        &self,
        caller: Address,
        pool: Address,
        tokens: &TokenInOutMarket,
        amounts: &AmountsOutMaxFee,
    ) -> PoolResult<TransactionReceipt> {
        let (call, amount_out, decimals_out) =
            self.swap_exact_amount_out_call(pool, tokens, amounts).await?;

        let max_out = self
            .max_ratio_units(pool, tokens.token_out, MAX_OUT_RATIO_DIVISOR)
            .await?;
        ensure_within("tokenAmountOut", amount_out, max_out, decimals_out)?;

        self.exec.send(caller, call).await
    }
}
