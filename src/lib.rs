//! Solana support for the x402 HTTP payment-challenge protocol.
//!
//! This crate implements the V1 "exact" scheme for SPL tokens on Solana. A
//! resource server answers unpaid requests with HTTP 402 and a JSON challenge;
//! a client pays by transferring tokens on-chain and retries with the
//! transaction signature in the `Authorization` header.
//!
//! # Architecture
//!
//! Unlike schemes where a facilitator settles a signed authorization on the
//! payer's behalf, here the client settles directly:
//!
//! 1. **Server** returns a [`PaymentChallenge`](v1_solana_exact::PaymentChallenge)
//!    listing accepted payment requirements
//! 2. **Client** picks a requirement and transfers `maxAmountRequired` base
//!    units of the asset to the recipient's associated token account
//! 3. **Client** waits for `confirmed` commitment, then retries with
//!    `Authorization: x402 svm/1; signature=<sig>`
//! 4. **Server** verifies the signature and returns the resource
//!
//! # Feature Flags
//!
//! - `server` - Axum paywall that issues challenges and grants access
//! - `client` - SPL transfer construction and the paying HTTP client
//! - `rpc` - [`SolanaChainProvider`](chain::SolanaChainProvider) backed by a
//!   JSON-RPC endpoint
//!
//! # Usage
//!
//! ## Server: Describing a Payment
//!
//! ```ignore
//! use x402_chain_solana::V1SolanaExact;
//! use x402_chain_solana::chain::SolanaTokenDeployment;
//!
//! let usdc = SolanaTokenDeployment::mainnet_usdc();
//! let requirement = V1SolanaExact::payment_requirement(
//!     "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh".parse()?,
//!     usdc.amount(10_000), // 0.01 USDC
//!     "/api/protected",
//!     "Access to protected content",
//! );
//! ```
//!
//! ## Client: Paying for a Resource
//!
//! ```ignore
//! use x402_chain_solana::X402Client;
//!
//! let client = X402Client::new(Some(wallet), provider, config);
//! let outcome = client.fetch(url, &body).await?;
//! ```

pub mod chain;
pub mod v1_solana_exact;

mod networks;
pub use networks::*;

pub use v1_solana_exact::V1SolanaExact;

#[cfg(feature = "client")]
pub use v1_solana_exact::client::{KeypairWallet, X402Client};

#[cfg(feature = "server")]
pub use v1_solana_exact::server::Paywall;
