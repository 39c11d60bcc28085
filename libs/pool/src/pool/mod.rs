//! Two-token weighted pool client
//!
//! [`Pool`] wraps a [`ChainClient`] and exposes every pool contract method
//! as a typed async call. Amounts cross the API as human-readable strings
//! and are converted to base units using each token's decimals.
//!
//! Reads and quotes live here; state-changing operations are split by
//! concern into `swap`, `liquidity` and `fees`.

mod fees;
mod liquidity;
mod swap;

use ethers::abi::Token;
use ethers::types::{Address, H256, U256};
use network_config::NetworkConfig;
use std::sync::Arc;

use crate::abi::PoolAbi;
use crate::chain::ChainClient;
use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
use crate::events::{self, LOG_EXIT, LOG_JOIN, LOG_SWAP};
use crate::executor::CallExecutor;
use crate::types::{CurrentFees, PoolPriceAndFees};
use crate::units::{amount_to_units, format_scaled, from_wei, pow10, to_wei, units_to_amount};

/// Number of tokens a pool holds: base token and datatoken
pub const POOL_TOKEN_COUNT: usize = 2;

/// Largest fraction of the in-token reserve a single trade or add may use
const MAX_IN_RATIO_DIVISOR: u64 = 2;

/// Largest fraction of the out-token reserve a single trade or removal may take
const MAX_OUT_RATIO_DIVISOR: u64 = 3;

/// Client for weighted pool contracts
pub struct Pool<C> {
    exec: CallExecutor<C>,
}

impl<C> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Self {
            exec: self.exec.clone(),
        }
    }
}

impl<C: ChainClient> Pool<C> {
    /// Client using the embedded ABI
    pub fn new(chain: Arc<C>, config: PoolConfig) -> PoolResult<Self> {
        Ok(Self::with_abi(chain, PoolAbi::load()?, config))
    }

    /// Client using a caller-supplied ABI
    pub fn with_abi(chain: Arc<C>, abi: PoolAbi, config: PoolConfig) -> Self {
        Self {
            exec: CallExecutor::new(chain, abi, config),
        }
    }

    /// Client configured for a resolved network
    pub fn for_network(chain: Arc<C>, network: &NetworkConfig) -> PoolResult<Self> {
        Self::new(chain, PoolConfig::from_network(network))
    }

    pub fn executor(&self) -> &CallExecutor<C> {
        &self.exec
    }

    pub fn config(&self) -> &PoolConfig {
        self.exec.config()
    }

    async fn query_address(&self, pool: Address, method: &str) -> PoolResult<Address> {
        self.exec.query(self.exec.pool_call(pool, method, vec![])?).await
    }

    async fn query_units(&self, pool: Address, method: &str, args: Vec<Token>) -> PoolResult<U256> {
        self.exec.query(self.exec.pool_call(pool, method, args)?).await
    }

    async fn query_wei(&self, pool: Address, method: &str, args: Vec<Token>) -> PoolResult<String> {
        Ok(from_wei(self.query_units(pool, method, args).await?))
    }

    // ---------------------------------------------------------------------
    // Pool state
    // ---------------------------------------------------------------------

    /// Pool shares held by `account`
    pub async fn shares_balance(&self, account: Address, pool: Address) -> PoolResult<String> {
        self.query_wei(pool, "balanceOf", vec![Token::Address(account)])
            .await
    }

    pub async fn get_num_tokens(&self, pool: Address) -> PoolResult<U256> {
        self.query_units(pool, "getNumTokens", vec![]).await
    }

    pub async fn get_pool_shares_total_supply(&self, pool: Address) -> PoolResult<String> {
        self.query_wei(pool, "totalSupply", vec![]).await
    }

    /// Tokens bound so far, including before finalization
    pub async fn get_current_tokens(&self, pool: Address) -> PoolResult<Vec<Address>> {
        self.exec
            .query(self.exec.pool_call(pool, "getCurrentTokens", vec![])?)
            .await
    }

    /// Tokens of a finalized pool
    pub async fn get_final_tokens(&self, pool: Address) -> PoolResult<Vec<Address>> {
        self.exec
            .query(self.exec.pool_call(pool, "getFinalTokens", vec![])?)
            .await
    }

    pub async fn get_controller(&self, pool: Address) -> PoolResult<Address> {
        self.query_address(pool, "getController").await
    }

    pub async fn get_base_token(&self, pool: Address) -> PoolResult<Address> {
        self.query_address(pool, "getBaseTokenAddress").await
    }

    pub async fn get_datatoken(&self, pool: Address) -> PoolResult<Address> {
        self.query_address(pool, "getDatatokenAddress").await
    }

    /// Address allowed to collect and reconfigure the publish market fee
    pub async fn get_market_fee_collector(&self, pool: Address) -> PoolResult<Address> {
        self.query_address(pool, "_publishMarketCollector").await
    }

    pub async fn get_opc_collector(&self, pool: Address) -> PoolResult<Address> {
        self.query_address(pool, "_opcCollector").await
    }

    pub async fn is_bound(&self, pool: Address, token: Address) -> PoolResult<bool> {
        self.exec
            .query(self.exec.pool_call(pool, "isBound", vec![Token::Address(token)])?)
            .await
    }

    pub async fn is_finalized(&self, pool: Address) -> PoolResult<bool> {
        self.exec
            .query(self.exec.pool_call(pool, "isFinalized", vec![])?)
            .await
    }

    /// Pool balance of `token`, in that token's units
    pub async fn get_reserve(
        &self,
        pool: Address,
        token: Address,
        decimals: Option<u8>,
    ) -> PoolResult<String> {
        let decimals = self.exec.resolve_decimals(token, decimals).await;
        let reserve = self
            .query_units(pool, "getBalance", vec![Token::Address(token)])
            .await?;
        Ok(units_to_amount(reserve, decimals))
    }

    // ---------------------------------------------------------------------
    // Fees and weights
    // ---------------------------------------------------------------------

    /// Liquidity provider swap fee as a fraction
    pub async fn get_swap_fee(&self, pool: Address) -> PoolResult<String> {
        self.query_wei(pool, "getSwapFee", vec![]).await
    }

    /// Publish market swap fee as a fraction
    pub async fn get_market_fee(&self, pool: Address) -> PoolResult<String> {
        self.query_wei(pool, "getMarketFee", vec![]).await
    }

    /// Protocol community swap fee as a fraction
    pub async fn get_opc_fee(&self, pool: Address) -> PoolResult<String> {
        self.query_wei(pool, "getOPCFee", vec![]).await
    }

    pub async fn get_normalized_weight(&self, pool: Address, token: Address) -> PoolResult<String> {
        self.query_wei(pool, "getNormalizedWeight", vec![Token::Address(token)])
            .await
    }

    pub async fn get_denormalized_weight(
        &self,
        pool: Address,
        token: Address,
    ) -> PoolResult<String> {
        self.query_wei(pool, "getDenormalizedWeight", vec![Token::Address(token)])
            .await
    }

    pub async fn get_total_denormalized_weight(&self, pool: Address) -> PoolResult<String> {
        self.query_wei(pool, "getTotalDenormalizedWeight", vec![])
            .await
    }

    /// Uncollected publish market fees in `token`
    pub async fn get_market_fees(&self, pool: Address, token: Address) -> PoolResult<String> {
        let decimals = self.exec.token_decimals(token).await;
        let fees = self
            .query_units(pool, "publishMarketFees", vec![Token::Address(token)])
            .await?;
        Ok(units_to_amount(fees, decimals))
    }

    /// Uncollected community fees in `token`
    pub async fn get_community_fees(&self, pool: Address, token: Address) -> PoolResult<String> {
        let decimals = self.exec.token_decimals(token).await;
        let fees = self
            .query_units(pool, "communityFees", vec![Token::Address(token)])
            .await?;
        Ok(units_to_amount(fees, decimals))
    }

    pub async fn get_current_market_fees(&self, pool: Address) -> PoolResult<CurrentFees> {
        self.current_fees(pool, "getCurrentMarketFees").await
    }

    pub async fn get_current_opc_fees(&self, pool: Address) -> PoolResult<CurrentFees> {
        self.current_fees(pool, "getCurrentOPCFees").await
    }

    async fn current_fees(&self, pool: Address, method: &str) -> PoolResult<CurrentFees> {
        let (tokens, raw): (Vec<Address>, Vec<U256>) = self
            .exec
            .query(self.exec.pool_call(pool, method, vec![])?)
            .await?;

        if tokens.len() != raw.len() {
            return Err(PoolError::Decode {
                method: method.to_string(),
                reason: format!("{} tokens but {} amounts", tokens.len(), raw.len()),
            });
        }

        let mut amounts = Vec::with_capacity(raw.len());
        for (token, amount) in tokens.iter().zip(raw) {
            let decimals = self.exec.token_decimals(*token).await;
            amounts.push(units_to_amount(amount, decimals));
        }

        Ok(CurrentFees { tokens, amounts })
    }

    // ---------------------------------------------------------------------
    // Prices and quotes
    // ---------------------------------------------------------------------

    /// Price of `token_out` in `token_in` including all swap fees
    pub async fn get_spot_price(
        &self,
        pool: Address,
        token_in: Address,
        token_out: Address,
        swap_market_fee: &str,
    ) -> PoolResult<String> {
        let decimals_in = self.exec.token_decimals(token_in).await;
        let decimals_out = self.exec.token_decimals(token_out).await;

        let raw = self
            .query_units(
                pool,
                "getSpotPrice",
                vec![
                    Token::Address(token_in),
                    Token::Address(token_out),
                    Token::Uint(to_wei(swap_market_fee)?),
                ],
            )
            .await?;

        rescale_spot_price(raw, decimals_in, decimals_out).ok_or_else(|| PoolError::Decode {
            method: "getSpotPrice".to_string(),
            reason: format!("price {} overflows when rescaled", raw),
        })
    }

    /// Token-in amount needed to receive `token_amount_out`, with fee breakdown
    pub async fn get_amount_in_exact_out(
        &self,
        pool: Address,
        token_in: Address,
        token_out: Address,
        token_amount_out: &str,
        swap_market_fee: &str,
    ) -> PoolResult<PoolPriceAndFees> {
        let decimals_in = self.exec.token_decimals(token_in).await;
        let decimals_out = self.exec.token_decimals(token_out).await;

        let amount_out = amount_to_units(token_amount_out, decimals_out)?;
        let max_out = self
            .max_ratio_units(pool, token_out, MAX_OUT_RATIO_DIVISOR)
            .await?;
        ensure_within("tokenAmountOut", amount_out, max_out, decimals_out)?;

        let quote = self
            .query_quote(pool, "getAmountInExactOut", token_in, token_out, amount_out, swap_market_fee)
            .await?;
        Ok(price_and_fees(quote, decimals_in, decimals_in))
    }

    /// Token-out amount received for `token_amount_in`, with fee breakdown
    pub async fn get_amount_out_exact_in(
        &self,
        pool: Address,
        token_in: Address,
        token_out: Address,
        token_amount_in: &str,
        swap_market_fee: &str,
    ) -> PoolResult<PoolPriceAndFees> {
        let decimals_in = self.exec.token_decimals(token_in).await;
        let decimals_out = self.exec.token_decimals(token_out).await;

        let amount_in = amount_to_units(token_amount_in, decimals_in)?;
        let max_in = self
            .max_ratio_units(pool, token_in, MAX_IN_RATIO_DIVISOR)
            .await?;
        ensure_within("tokenAmountIn", amount_in, max_in, decimals_in)?;

        let quote = self
            .query_quote(pool, "getAmountOutExactIn", token_in, token_out, amount_in, swap_market_fee)
            .await?;
        Ok(price_and_fees(quote, decimals_out, decimals_in))
    }

    async fn query_quote(
        &self,
        pool: Address,
        method: &str,
        token_in: Address,
        token_out: Address,
        amount: U256,
        swap_market_fee: &str,
    ) -> PoolResult<[U256; 5]> {
        let (token_amount, lp_fee, opc_fee, publish_fee, consume_fee): (U256, U256, U256, U256, U256) =
            self.exec
                .query(self.exec.pool_call(
                    pool,
                    method,
                    vec![
                        Token::Address(token_in),
                        Token::Address(token_out),
                        Token::Uint(amount),
                        Token::Uint(to_wei(swap_market_fee)?),
                    ],
                )?)
                .await?;
        Ok([token_amount, lp_fee, opc_fee, publish_fee, consume_fee])
    }

    /// Pool shares minted for a single-sided deposit of `token_amount_in`
    pub async fn calc_pool_out_single_in(
        &self,
        pool: Address,
        token_in: Address,
        token_amount_in: &str,
    ) -> PoolResult<String> {
        let decimals = self.exec.token_decimals(token_in).await;
        let amount = amount_to_units(token_amount_in, decimals)?;
        self.query_wei(
            pool,
            "calcPoolOutSingleIn",
            vec![Token::Address(token_in), Token::Uint(amount)],
        )
        .await
    }

    /// `token_in` needed to mint exactly `pool_amount_out` shares
    pub async fn calc_single_in_pool_out(
        &self,
        pool: Address,
        token_in: Address,
        pool_amount_out: &str,
    ) -> PoolResult<String> {
        let decimals = self.exec.token_decimals(token_in).await;
        let amount = self
            .query_units(
                pool,
                "calcSingleInPoolOut",
                vec![Token::Address(token_in), Token::Uint(to_wei(pool_amount_out)?)],
            )
            .await?;
        Ok(units_to_amount(amount, decimals))
    }

    /// `token_out` received for burning `pool_amount_in` shares
    pub async fn calc_single_out_pool_in(
        &self,
        pool: Address,
        token_out: Address,
        pool_amount_in: &str,
    ) -> PoolResult<String> {
        let decimals = self.exec.token_decimals(token_out).await;
        let amount = self
            .query_units(
                pool,
                "calcSingleOutPoolIn",
                vec![Token::Address(token_out), Token::Uint(to_wei(pool_amount_in)?)],
            )
            .await?;
        Ok(units_to_amount(amount, decimals))
    }

    /// Pool shares burned to withdraw exactly `token_amount_out`
    pub async fn calc_pool_in_single_out(
        &self,
        pool: Address,
        token_out: Address,
        token_amount_out: &str,
    ) -> PoolResult<String> {
        let decimals = self.exec.token_decimals(token_out).await;
        let amount = amount_to_units(token_amount_out, decimals)?;
        self.query_wei(
            pool,
            "calcPoolInSingleOut",
            vec![Token::Address(token_out), Token::Uint(amount)],
        )
        .await
    }

    // ---------------------------------------------------------------------
    // Trade size limits
    // ---------------------------------------------------------------------

    /// Largest `tokenAmountIn` a fixed-input swap accepts
    pub async fn get_max_swap_exact_in(&self, pool: Address, token_in: Address) -> PoolResult<String> {
        self.max_ratio_amount(pool, token_in, MAX_IN_RATIO_DIVISOR).await
    }

    /// Largest `tokenAmountOut` a fixed-output swap accepts
    pub async fn get_max_swap_exact_out(
        &self,
        pool: Address,
        token_out: Address,
    ) -> PoolResult<String> {
        self.max_ratio_amount(pool, token_out, MAX_OUT_RATIO_DIVISOR).await
    }

    /// Largest single-sided deposit of `token_in`
    pub async fn get_max_add_liquidity(&self, pool: Address, token_in: Address) -> PoolResult<String> {
        self.max_ratio_amount(pool, token_in, MAX_IN_RATIO_DIVISOR).await
    }

    /// Largest single-sided withdrawal of `token_out`
    pub async fn get_max_remove_liquidity(
        &self,
        pool: Address,
        token_out: Address,
    ) -> PoolResult<String> {
        self.max_ratio_amount(pool, token_out, MAX_OUT_RATIO_DIVISOR).await
    }

    async fn max_ratio_amount(&self, pool: Address, token: Address, divisor: u64) -> PoolResult<String> {
        let decimals = self.exec.token_decimals(token).await;
        let max = self.max_ratio_units(pool, token, divisor).await?;
        Ok(units_to_amount(max, decimals))
    }

    async fn max_ratio_units(&self, pool: Address, token: Address, divisor: u64) -> PoolResult<U256> {
        let reserve = self
            .query_units(pool, "getBalance", vec![Token::Address(token)])
            .await?;
        Ok(reserve / U256::from(divisor))
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    pub fn get_swap_event_signature(&self) -> PoolResult<H256> {
        events::event_signature(self.exec.abi(), LOG_SWAP)
    }

    pub fn get_join_event_signature(&self) -> PoolResult<H256> {
        events::event_signature(self.exec.abi(), LOG_JOIN)
    }

    pub fn get_exit_event_signature(&self) -> PoolResult<H256> {
        events::event_signature(self.exec.abi(), LOG_EXIT)
    }
}

/// Convert the contract's 18-decimal spot price into a human price.
///
/// When the in-token has more decimals the raw value is scaled up by the
/// difference; otherwise it is scaled down by twice the difference. Both
/// branches are exact decimal shifts. Returns `None` if scaling up
/// overflows 256 bits.
pub fn rescale_spot_price(raw: U256, decimals_in: u8, decimals_out: u8) -> Option<String> {
    if decimals_in > decimals_out {
        let diff = u32::from(decimals_in - decimals_out);
        let scaled = raw.checked_mul(pow10(diff)?)?;
        Some(format_scaled(scaled, 18))
    } else {
        let diff = u32::from(decimals_out - decimals_in);
        Some(format_scaled(raw, 18 + 2 * diff))
    }
}

fn price_and_fees(quote: [U256; 5], amount_decimals: u8, fee_decimals: u8) -> PoolPriceAndFees {
    let [token_amount, lp_fee, opc_fee, publish_fee, consume_fee] = quote;
    PoolPriceAndFees {
        token_amount: units_to_amount(token_amount, amount_decimals),
        liquidity_provider_swap_fee_amount: units_to_amount(lp_fee, fee_decimals),
        opc_fee_amount: units_to_amount(opc_fee, fee_decimals),
        publish_market_swap_fee_amount: units_to_amount(publish_fee, fee_decimals),
        consume_market_swap_fee_amount: units_to_amount(consume_fee, fee_decimals),
    }
}

/// Fail with [`PoolError::ExceedsMaxRatio`] when `requested > max`
fn ensure_within(field: &'static str, requested: U256, max: U256, decimals: u8) -> PoolResult<()> {
    if requested > max {
        return Err(PoolError::ExceedsMaxRatio {
            field,
            requested: units_to_amount(requested, decimals),
            max: units_to_amount(max, decimals),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(value: &str) -> U256 {
        U256::from_dec_str(value).unwrap()
    }

    #[test]
    fn test_spot_price_same_decimals_is_plain_wei() {
        let raw = units("2500000000000000000");
        assert_eq!(rescale_spot_price(raw, 18, 18).unwrap(), "2.5");
        assert_eq!(rescale_spot_price(raw, 6, 6).unwrap(), "2.5");
    }

    #[test]
    fn test_spot_price_scales_up_when_in_token_has_more_decimals() {
        // 18-decimal in, 6-decimal out: diff 12
        let raw = units("2000000");
        assert_eq!(rescale_spot_price(raw, 18, 6).unwrap(), "2");

        // 18-decimal in, 8-decimal out: diff 10
        let raw = units("150000000");
        assert_eq!(rescale_spot_price(raw, 18, 8).unwrap(), "1.5");
    }

    #[test]
    fn test_spot_price_scales_down_twice_when_out_token_has_more_decimals() {
        // 6-decimal in, 18-decimal out: diff 12, divided by 10^24 on top of wei
        let raw = units("3000000000000000000000000000000000000000000");
        assert_eq!(rescale_spot_price(raw, 6, 18).unwrap(), "3");

        // 8-decimal in, 18-decimal out: diff 10
        let raw = units("1000000000000000000");
        assert_eq!(rescale_spot_price(raw, 8, 18).unwrap(), "0.00000000000000000001");
    }

    #[test]
    fn test_spot_price_overflow_is_none() {
        assert!(rescale_spot_price(U256::MAX, 18, 6).is_none());
    }

    #[test]
    fn test_ensure_within_reports_human_amounts() {
        assert!(ensure_within("tokenAmountIn", units("500"), units("500"), 0).is_ok());

        let err = ensure_within("tokenAmountIn", units("600000000"), units("500000000"), 6).unwrap_err();
        assert_eq!(err.to_string(), "tokenAmountIn 600 is greater than 500");
    }

    #[test]
    fn test_price_and_fees_uses_separate_decimals() {
        let quote = [
            units("5000000"),
            units("1000000000000000"),
            units("2000000000000000"),
            units("0"),
            units("1000000000000000000"),
        ];
        let fees = price_and_fees(quote, 6, 18);
        assert_eq!(fees.token_amount, "5");
        assert_eq!(fees.liquidity_provider_swap_fee_amount, "0.001");
        assert_eq!(fees.opc_fee_amount, "0.002");
        assert_eq!(fees.publish_market_swap_fee_amount, "0");
        assert_eq!(fees.consume_market_swap_fee_amount, "1");
    }
}
