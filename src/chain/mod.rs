//! Core Solana chain types, configuration, and provider.
//!
//! This module provides the fundamental types for interacting with
//! the Solana blockchain within the x402 protocol:
//!
//! - [`SolanaAddress`] - base58 public key wrapper with serialization
//! - [`SolanaNetwork`] - x402 v1 cluster names (`solana`, `solana-devnet`)
//! - [`SolanaTokenDeployment`] - SPL token mint deployment info
//! - [`SolanaChainConfig`] - Configuration for connecting to an RPC node
//! - [`SolanaRpc`] - The chain operations used by clients and verifiers

pub mod types;
pub use types::*;

pub mod config;
pub use config::*;

pub mod provider;
pub use provider::*;
