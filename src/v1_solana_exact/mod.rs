//! V1 Solana "exact" payment scheme implementation.
//!
//! This module implements the "exact" scheme of the V1 x402 protocol for SPL
//! tokens on Solana, using plain network names (`solana`, `solana-devnet`).
//!
//! # Payment Model
//!
//! There is no facilitator. The client settles on-chain first and then proves
//! it did so:
//!
//! 1. Server answers an unpaid request with 402 and a [`PaymentChallenge`]
//! 2. Client transfers exactly `maxAmountRequired` base units of `asset`
//!    to the associated token account of `payTo`
//! 3. Client waits for the transfer to reach `confirmed` commitment
//! 4. Client retries with `Authorization: x402 svm/1; signature=<sig>`
//! 5. Server checks the credential with its [`Verifier`] and serves the resource
//!
//! # Usage
//!
//! ```ignore
//! use x402_chain_solana::v1_solana_exact::{InMemoryProofStore, Paywall, PaywallConfig};
//!
//! let store = Arc::new(InMemoryProofStore::new());
//! let paywall = Arc::new(Paywall::with_stub_verifier(PaywallConfig::default(), store));
//! let app = paywall.router();
//! ```

#[cfg(feature = "server")]
pub mod server;
#[cfg(feature = "server")]
pub use server::*;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "client")]
pub use client::*;

pub mod store;
pub use store::*;

pub mod verifier;
pub use verifier::*;

pub mod types;
pub use types::*;

use crate::chain::SOLANA_NAMESPACE;

/// The V1 Solana "exact" payment scheme.
pub struct V1SolanaExact;

impl V1SolanaExact {
    pub fn namespace(&self) -> &str {
        SOLANA_NAMESPACE
    }

    pub fn scheme(&self) -> &str {
        ExactScheme.as_ref()
    }

    pub fn x402_version(&self) -> u8 {
        X402_VERSION
    }

    /// Identifier in the form `v{version}-{namespace}-{scheme}`.
    pub fn id(&self) -> String {
        format!("v{}-{}-{}", self.x402_version(), self.namespace(), self.scheme())
    }
}
