//! Chain connection seam
//!
//! The pool client never talks to a transport directly. It goes through
//! [`ChainClient`], which an application satisfies with [`EthersChain`]
//! wrapping any ethers middleware stack (a bare `Provider<Http>` for reads,
//! a `SignerMiddleware` for writes), and which tests satisfy with a mock.

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Bytes, TransactionReceipt, U256};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::error::ChainError;

/// Receipt polling interval for submitted transactions
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Minimal chain surface the pool client needs
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Execute a read-only call and return the raw ABI-encoded output
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, ChainError>;

    /// Simulate a transaction and return its gas usage
    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, ChainError>;

    /// Suggested gas price in wei
    async fn gas_price(&self) -> Result<U256, ChainError>;

    /// Submit a transaction and wait for its receipt
    async fn send_transaction(&self, tx: TypedTransaction)
        -> Result<TransactionReceipt, ChainError>;
}

/// [`ChainClient`] backed by an ethers middleware
#[derive(Debug)]
pub struct EthersChain<M> {
    client: Arc<M>,
}

impl<M> Clone for EthersChain<M> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<M: Middleware> EthersChain<M> {
    pub fn new(client: Arc<M>) -> Self {
        Self { client }
    }

    /// Underlying middleware
    pub fn inner(&self) -> &Arc<M> {
        &self.client
    }
}

impl EthersChain<Provider<Http>> {
    /// Read-only connection to an HTTP JSON-RPC endpoint
    pub fn connect(rpc_url: &str) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChainError::Provider(format!("Invalid RPC URL {}: {}", rpc_url, e)))?
            .interval(RECEIPT_POLL_INTERVAL);
        Ok(Self::new(Arc::new(provider)))
    }
}

impl EthersChain<SignerMiddleware<Provider<Http>, LocalWallet>> {
    /// Signing connection: transactions are signed locally with `private_key`
    pub fn connect_with_signer(
        rpc_url: &str,
        private_key: &str,
        chain_id: u64,
    ) -> Result<Self, ChainError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChainError::Provider(format!("Invalid RPC URL {}: {}", rpc_url, e)))?
            .interval(RECEIPT_POLL_INTERVAL);
        let wallet = private_key
            .parse::<LocalWallet>()
            .map_err(|e| ChainError::Provider(format!("Invalid private key: {}", e)))?
            .with_chain_id(chain_id);
        debug!("Signing as {:#x} on chain {}", wallet.address(), chain_id);
        Ok(Self::new(Arc::new(SignerMiddleware::new(provider, wallet))))
    }
}

#[async_trait]
impl<M> ChainClient for EthersChain<M>
where
    M: Middleware + 'static,
{
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes, ChainError> {
        self.client
            .call(tx, None)
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))
    }

    async fn estimate_gas(&self, tx: &TypedTransaction) -> Result<U256, ChainError> {
        self.client
            .estimate_gas(tx, None)
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))
    }

    async fn gas_price(&self) -> Result<U256, ChainError> {
        self.client
            .get_gas_price()
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))
    }

    async fn send_transaction(
        &self,
        tx: TypedTransaction,
    ) -> Result<TransactionReceipt, ChainError> {
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))?;
        let tx_hash = pending.tx_hash();
        debug!("Submitted 0x{:x}, waiting for receipt", tx_hash);

        pending
            .await
            .map_err(|e| ChainError::Provider(e.to_string()))?
            .ok_or(ChainError::Dropped(tx_hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::TransactionRequest;

    #[tokio::test]
    async fn test_gas_price_through_mock_provider() {
        let (provider, mock) = Provider::mocked();
        mock.push(U256::from(30_000_000_000u64)).unwrap();

        let chain = EthersChain::new(Arc::new(provider));
        assert_eq!(
            chain.gas_price().await.unwrap(),
            U256::from(30_000_000_000u64)
        );
    }

    #[tokio::test]
    async fn test_estimate_gas_through_mock_provider() {
        let (provider, mock) = Provider::mocked();
        mock.push(U256::from(84_000u64)).unwrap();

        let chain = EthersChain::new(Arc::new(provider));
        let tx: TypedTransaction = TransactionRequest::new().into();
        assert_eq!(chain.estimate_gas(&tx).await.unwrap(), U256::from(84_000u64));
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_chain_error() {
        // No queued response: the mock transport errors out
        let (provider, _mock) = Provider::mocked();
        let chain = EthersChain::new(Arc::new(provider));

        let tx: TypedTransaction = TransactionRequest::new().into();
        assert!(matches!(
            chain.call(&tx).await,
            Err(ChainError::Provider(_))
        ));
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        assert!(EthersChain::connect("not a url").is_err());
        assert!(EthersChain::connect("http://127.0.0.1:8545").is_ok());
    }

    #[test]
    fn test_connect_with_signer_rejects_bad_key() {
        assert!(EthersChain::connect_with_signer("http://127.0.0.1:8545", "0xzz", 1).is_err());
    }
}
