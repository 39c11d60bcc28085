//! Pool event signatures
//!
//! Log topics for the three pool events, derived from the ABI so an injected
//! ABI with different event shapes yields matching topics. Used to build
//! `eth_getLogs` / subscription filters outside the client.

use ethers::types::H256;

use crate::abi::PoolAbi;
use crate::error::PoolResult;

/// Emitted on every swap
pub const LOG_SWAP: &str = "LOG_SWAP";

/// Emitted per token transferred into the pool on join
pub const LOG_JOIN: &str = "LOG_JOIN";

/// Emitted per token transferred out of the pool on exit
pub const LOG_EXIT: &str = "LOG_EXIT";

/// Topic (keccak256 of the canonical signature) for a named pool event
pub fn event_signature(abi: &PoolAbi, name: &str) -> PoolResult<H256> {
    Ok(abi.event(name)?.signature())
}

/// Topics for swap, join and exit, in that order
pub fn pool_event_topics(abi: &PoolAbi) -> PoolResult<[H256; 3]> {
    Ok([
        event_signature(abi, LOG_SWAP)?,
        event_signature(abi, LOG_JOIN)?,
        event_signature(abi, LOG_EXIT)?,
    ])
}

/// Convert H256 to hex string for JSON-RPC use
pub fn to_hex_string(hash: H256) -> String {
    format!("0x{:x}", hash)
}
