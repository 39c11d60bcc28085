//! Shared test fixtures: an in-memory chain that answers contract calls by
//! target address and 4-byte selector, and records submitted transactions.

#![allow(dead_code)]

use async_trait::async_trait;
use ethers::abi::{self, Function, Token};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionReceipt, H256, U256};
use parking_lot::Mutex;
use pool_client::{ChainClient, ChainError, Pool, PoolAbi, PoolConfig};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub const POOL: Address = Address::repeat_byte(0xaa);
pub const BASE_TOKEN: Address = Address::repeat_byte(0xb1);
pub const DATATOKEN: Address = Address::repeat_byte(0xd1);
pub const ALICE: Address = Address::repeat_byte(0xa1);
pub const COLLECTOR: Address = Address::repeat_byte(0xc1);
pub const MARKET: Address = Address::repeat_byte(0xe1);

pub const MOCK_GAS: u64 = 210_000;
pub const MOCK_GAS_PRICE: u64 = 30_000_000_000;
pub const MOCK_TX_HASH: H256 = H256::repeat_byte(0x11);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Formatted log output collected by a thread-local subscriber
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Capture everything logged on this thread until the guard drops.
    /// `#[tokio::test]` runs on a single thread, so awaited calls are covered.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.buffer.lock())
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// True when some line at `level` contains `needle`
    pub fn contains(&self, level: &str, needle: &str) -> bool {
        self.lines()
            .iter()
            .any(|line| line.contains(level) && line.contains(needle))
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

pub fn units(value: &str) -> U256 {
    U256::from_dec_str(value).unwrap()
}

fn selector(data: &[u8]) -> Option<[u8; 4]> {
    data.get(..4).map(|s| [s[0], s[1], s[2], s[3]])
}

/// Mocked [`ChainClient`]
pub struct MockChain {
    abi: PoolAbi,
    responses: Mutex<HashMap<(Address, [u8; 4]), Bytes>>,
    failing: Mutex<HashSet<[u8; 4]>>,
    estimates_fail: Mutex<bool>,
    calls: Mutex<Vec<TypedTransaction>>,
    sent: Mutex<Vec<TypedTransaction>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            abi: PoolAbi::load().unwrap(),
            responses: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            estimates_fail: Mutex::new(false),
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn pool_function(&self, method: &str) -> &Function {
        self.abi.function(method).unwrap()
    }

    /// Answer `method` on `to` with the ABI encoding of `outputs`
    pub fn respond(&self, to: Address, function: &Function, outputs: &[Token]) {
        self.responses
            .lock()
            .insert((to, function.short_signature()), Bytes::from(abi::encode(outputs)));
    }

    pub fn pool_returns(&self, method: &str, outputs: &[Token]) {
        let function = self.pool_function(method).clone();
        self.respond(POOL, &function, outputs);
    }

    pub fn token_decimals(&self, token: Address, decimals: u8) {
        self.token_decimals_raw(token, U256::from(decimals));
    }

    /// `decimals()` answering with any word, including out-of-range values
    pub fn token_decimals_raw(&self, token: Address, decimals: U256) {
        let function = self.abi.erc20_function("decimals").unwrap().clone();
        self.respond(token, &function, &[Token::Uint(decimals)]);
    }

    /// `getBalance(token)` returns `reserve` regardless of the token asked
    pub fn pool_reserve(&self, reserve: U256) {
        self.pool_returns("getBalance", &[Token::Uint(reserve)]);
    }

    /// Calls, estimates and submissions of `method` revert
    pub fn fail(&self, method: &str) {
        let selector = self.pool_function(method).short_signature();
        self.failing.lock().insert(selector);
    }

    pub fn fail_estimates(&self) {
        *self.estimates_fail.lock() = true;
    }

    pub fn calls(&self) -> Vec<TypedTransaction> {
        self.calls.lock().clone()
    }

    pub fn sent(&self) -> Vec<TypedTransaction> {
        self.sent.lock().clone()
    }

    /// Decoded arguments of the only submitted transaction
    pub fn sent_args(&self, method: &str) -> Vec<Token> {
        let sent = self.sent();
        assert_eq!(sent.len(), 1, "expected exactly one submitted transaction");
        let data = sent[0].data().unwrap();
        let function = self.pool_function(method);
        assert_eq!(&data[..4], &function.short_signature()[..]);
        function.decode_input(&data[4..]).unwrap()
    }

    fn check_failing(&self, tx: &TypedTransaction) -> Result<[u8; 4], ChainError> {
        let data = tx.data().map(|d| d.to_vec()).unwrap_or_default();
        let selector = selector(&data)
            .ok_or_else(|| ChainError::Provider("missing calldata".to_string()))?;
        if self.failing.lock().contains(&selector) {
            return Err(ChainError::Provider("execution reverted".to_string()));
        }
        Ok(selector)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, ChainError> {
        self.calls.lock().push(tx.clone());
        let selector = self.check_failing(tx)?;
        let to = tx.to_addr().copied().unwrap_or_default();
        self.responses
            .lock()
            .get(&(to, selector))
            .cloned()
            .ok_or_else(|| ChainError::Provider(format!("no response for {:#x}", to)))
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, ChainError> {
        self.check_failing(tx)?;
        if *self.estimates_fail.lock() {
            return Err(ChainError::Provider("gas required exceeds allowance".to_string()));
        }
        Ok(U256::from(MOCK_GAS))
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        Ok(U256::from(MOCK_GAS_PRICE))
    }

    async fn send_transaction(
        &self,
        tx: TypedTransaction,
    ) -> Result<TransactionReceipt, ChainError> {
        self.check_failing(&tx)?;
        let from = tx.from().copied().unwrap_or_default();
        self.sent.lock().push(tx);
        Ok(TransactionReceipt {
            transaction_hash: MOCK_TX_HASH,
            from,
            to: Some(POOL),
            status: Some(1u64.into()),
            ..Default::default()
        })
    }
}

pub fn pool_with(chain: &Arc<MockChain>) -> Pool<MockChain> {
    init_tracing();
    Pool::new(Arc::clone(chain), PoolConfig::default()).unwrap()
}

pub fn setup() -> (Arc<MockChain>, Pool<MockChain>) {
    let chain = Arc::new(MockChain::new());
    let pool = pool_with(&chain);
    (chain, pool)
}
