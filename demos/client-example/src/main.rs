//! Example client that pays for an HTTP resource with SPL tokens on Solana.
//!
//! This example demonstrates how a client (human or AI agent) would:
//! 1. Make a request to a protected endpoint
//! 2. Receive a 402 Payment Required response
//! 3. Transfer the requested amount of USDC on Solana and wait for confirmation
//! 4. Retry the request with the transaction signature
//!
//! [`X402Client::fetch`] performs all four steps.
//!
//! # Running
//!
//! ```bash
//! # Start the resource server first:
//! cargo run -p x402-solana-server
//!
//! # Then run this client with a funded Solana CLI keypair:
//! KEYPAIR_PATH=~/.config/solana/id.json cargo run -p x402-solana-client-example
//! ```
//!
//! # Configuration
//!
//! - `ENDPOINT`             - Protected URL (default: http://localhost:3000/api/protected)
//! - `KEYPAIR_PATH`         - Solana CLI keypair file (default: ~/.config/solana/id.json)
//! - `X402_NETWORK`         - `solana` or `solana-devnet` (default: solana)
//! - `SOLANA_RPC_URL`       - RPC endpoint (default: public endpoint of the network)
//! - `CONFIRM_TIMEOUT_SECS` - Confirmation timeout (default: 60)

use std::env;
use std::time::Duration;

use x402_chain_solana::chain::{SolanaChainConfig, SolanaChainProvider, SolanaNetwork};
use x402_chain_solana::v1_solana_exact::{KeypairWallet, PaymentOutcome, X402Client};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    let endpoint = env::var("ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:3000/api/protected".to_string());
    let network: SolanaNetwork = env::var("X402_NETWORK")
        .unwrap_or_else(|_| "solana".to_string())
        .parse()?;

    let mut config = SolanaChainConfig::for_network(network);
    if let Ok(rpc_url) = env::var("SOLANA_RPC_URL") {
        config = config.with_rpc_url(rpc_url);
    }
    if let Some(secs) = env::var("CONFIRM_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
    {
        config = config.with_confirm_timeout(Duration::from_secs(secs));
    }

    let keypair_path = env::var("KEYPAIR_PATH").unwrap_or_else(|_| {
        let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{home}/.config/solana/id.json")
    });
    // A missing wallet is reported by the client once payment is required
    let wallet = match KeypairWallet::from_json_file(&keypair_path) {
        Ok(wallet) => {
            tracing::info!(pubkey = %wallet.pubkey(), "Loaded wallet");
            Some(wallet)
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %keypair_path, "No wallet available");
            None
        }
    };

    let provider = SolanaChainProvider::from_config(&config);
    tracing::info!(network = %network, rpc_url = %provider.rpc_url(), "Using Solana RPC");

    let client = X402Client::new(wallet, provider, config);
    let body = serde_json::json!({ "message": "Requesting access to protected content" });

    tracing::info!("Requesting {endpoint}");
    match client.fetch(&endpoint, &body).await {
        Ok(PaymentOutcome::NotRequired(body)) => {
            println!("No payment required: {body}");
        }
        Ok(PaymentOutcome::Paid(access)) => {
            println!("Payment successful!");
            println!("Transaction: {}", access.transaction_signature);
            println!("{}", serde_json::to_string_pretty(&access.response)?);
        }
        Err(e) => {
            println!("Payment failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}
