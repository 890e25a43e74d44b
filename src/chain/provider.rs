//! Solana chain access for transfer submission and payment verification.
//!
//! The chain is treated as a black box behind [`SolanaRpc`]: something that
//! can look up accounts, hand out a recent blockhash, accept a signed
//! transaction and report its confirmation status. [`SolanaChainProvider`]
//! (behind the `rpc` feature) implements it over Solana JSON-RPC.

use async_trait::async_trait;
use solana_hash::Hash;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::Transaction;

/// Confirmation state of a submitted transaction at `confirmed` commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
    /// The node has not seen the transaction reach `confirmed` yet.
    Pending,
    /// The transaction landed and executed successfully.
    Confirmed,
    /// The transaction landed but execution failed.
    Failed(String),
}

/// The chain operations the x402 client and verifiers depend on.
#[async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Returns whether an account exists at `address`.
    async fn account_exists(&self, address: &Pubkey) -> Result<bool, SolanaProviderError>;

    /// Returns a recent blockhash and the last block height at which a
    /// transaction using it is still valid.
    async fn latest_blockhash(&self) -> Result<(Hash, u64), SolanaProviderError>;

    /// Returns the current block height.
    async fn block_height(&self) -> Result<u64, SolanaProviderError>;

    /// Submits a fully signed transaction and returns its signature.
    async fn send_transaction(
        &self,
        transaction: &Transaction,
    ) -> Result<Signature, SolanaProviderError>;

    /// Looks up the status of a previously submitted transaction.
    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<SignatureStatus, SolanaProviderError>;
}

/// Errors that can occur during Solana provider operations.
#[derive(Debug, thiserror::Error)]
pub enum SolanaProviderError {
    /// Failed to reach the RPC node.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to submit the transaction.
    #[error("Transaction submission failed: {0}")]
    SubmissionError(String),

    /// Failed to query chain state.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Transaction was rejected by the node.
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),
}

#[cfg(feature = "rpc")]
pub use rpc::SolanaChainProvider;

#[cfg(feature = "rpc")]
mod rpc {
    use async_trait::async_trait;
    use solana_commitment_config::CommitmentConfig;
    use solana_hash::Hash;
    use solana_pubkey::Pubkey;
    use solana_rpc_client::nonblocking::rpc_client::RpcClient;
    use solana_signature::Signature;
    use solana_transaction::Transaction;

    use super::{SignatureStatus, SolanaProviderError, SolanaRpc};
    use crate::chain::{SolanaChainConfig, SolanaNetwork};

    /// Provider for interacting with a Solana RPC node.
    ///
    /// All reads and the confirmation check use `confirmed` commitment.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use x402_chain_solana::chain::{SolanaChainConfig, SolanaChainProvider, SolanaNetwork};
    ///
    /// let config = SolanaChainConfig::for_network(SolanaNetwork::Devnet);
    /// let provider = SolanaChainProvider::from_config(&config);
    /// ```
    pub struct SolanaChainProvider {
        network: SolanaNetwork,
        client: RpcClient,
    }

    impl SolanaChainProvider {
        /// Creates a new provider from configuration.
        pub fn from_config(config: &SolanaChainConfig) -> Self {
            Self {
                network: config.network,
                client: RpcClient::new_with_commitment(
                    config.rpc_url.clone(),
                    CommitmentConfig::confirmed(),
                ),
            }
        }

        /// Returns the cluster this provider talks to.
        pub fn network(&self) -> SolanaNetwork {
            self.network
        }

        /// Returns the RPC URL.
        pub fn rpc_url(&self) -> String {
            self.client.url()
        }
    }

    impl std::fmt::Debug for SolanaChainProvider {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("SolanaChainProvider")
                .field("network", &self.network)
                .field("rpc_url", &self.client.url())
                .finish()
        }
    }

    #[async_trait]
    impl SolanaRpc for SolanaChainProvider {
        async fn account_exists(&self, address: &Pubkey) -> Result<bool, SolanaProviderError> {
            let response = self
                .client
                .get_account_with_commitment(address, CommitmentConfig::confirmed())
                .await
                .map_err(|e| {
                    SolanaProviderError::QueryError(format!("getAccountInfo {address}: {e}"))
                })?;
            Ok(response.value.is_some())
        }

        async fn latest_blockhash(&self) -> Result<(Hash, u64), SolanaProviderError> {
            self.client
                .get_latest_blockhash_with_commitment(CommitmentConfig::confirmed())
                .await
                .map_err(|e| SolanaProviderError::ConnectionError(format!("getLatestBlockhash: {e}")))
        }

        async fn block_height(&self) -> Result<u64, SolanaProviderError> {
            self.client
                .get_block_height_with_commitment(CommitmentConfig::confirmed())
                .await
                .map_err(|e| SolanaProviderError::QueryError(format!("getBlockHeight: {e}")))
        }

        async fn send_transaction(
            &self,
            transaction: &Transaction,
        ) -> Result<Signature, SolanaProviderError> {
            let signature = self
                .client
                .send_transaction(transaction)
                .await
                .map_err(|e| match e.get_transaction_error() {
                    Some(tx_error) => SolanaProviderError::TransactionRejected(tx_error.to_string()),
                    None => SolanaProviderError::SubmissionError(e.to_string()),
                })?;
            tracing::debug!(%signature, network = %self.network, "Transaction submitted");
            Ok(signature)
        }

        async fn signature_status(
            &self,
            signature: &Signature,
        ) -> Result<SignatureStatus, SolanaProviderError> {
            let status = self
                .client
                .get_signature_status_with_commitment(signature, CommitmentConfig::confirmed())
                .await
                .map_err(|e| {
                    SolanaProviderError::QueryError(format!("getSignatureStatuses {signature}: {e}"))
                })?;
            Ok(match status {
                None => SignatureStatus::Pending,
                Some(Ok(())) => SignatureStatus::Confirmed,
                Some(Err(e)) => SignatureStatus::Failed(e.to_string()),
            })
        }
    }
}
