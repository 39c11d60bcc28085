//! Weighted pool client library
//!
//! Typed async client for two-token weighted AMM pool contracts: pool state
//! reads, price and fee quotes, swaps, liquidity management, fee collection
//! and event topic lookup.
//!
//! # Architecture
//!
//! ```text
//! libs/pool/
//! ├── abi/             # Contract ABIs (JSON, embedded)
//! └── src/
//!     ├── chain.rs     # ChainClient seam + ethers adapter
//!     ├── executor.rs  # query / estimate / send machinery
//!     ├── units.rs     # human amount <-> base unit conversion
//!     ├── events.rs    # LOG_SWAP / LOG_JOIN / LOG_EXIT topics
//!     └── pool/        # Pool client: reads, swap, liquidity, fees
//! ```
//!
//! # Design Principles
//! - Strings at the API boundary, exact `U256` base units inside
//! - Every operation returns [`PoolResult`]; chain failures are never
//!   collapsed into zero or false
//! - Gas estimation falls back to a fixed limit instead of failing
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pool_client::{EthersChain, Pool, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let chain = Arc::new(EthersChain::connect("http://127.0.0.1:8545")?);
//! let pool = Pool::new(chain, PoolConfig::default())?;
//!
//! let address = "0x0000000000000000000000000000000000000001".parse()?;
//! let fee = pool.get_swap_fee(address).await?;
//! println!("swap fee: {}", fee);
//! # Ok(())
//! # }
//! ```

pub mod abi;
pub mod chain;
pub mod config;
pub mod error;
pub mod events;
pub mod executor;
pub mod pool;
pub mod types;
pub mod units;

pub use abi::PoolAbi;
pub use chain::{ChainClient, EthersChain};
pub use config::{PoolConfig, DEFAULT_GAS_LIMIT};
pub use error::{ChainError, PoolError, PoolResult};
pub use events::{pool_event_topics, to_hex_string, LOG_EXIT, LOG_JOIN, LOG_SWAP};
pub use executor::{CallExecutor, ContractCall};
pub use pool::{rescale_spot_price, Pool, POOL_TOKEN_COUNT};
pub use types::{
    AmountsInMaxFee, AmountsOutMaxFee, CurrentFees, PoolPriceAndFees, TokenInOutMarket,
};
pub use units::{amount_to_units, from_wei, to_wei, units_to_amount, UnitsError};
