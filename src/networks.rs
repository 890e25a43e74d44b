//! Known Solana networks and token deployments.
//!
//! This module provides convenient methods to get token deployment information
//! for well-known Solana clusters.

use std::str::FromStr;

use crate::chain::{SolanaAddress, SolanaNetwork, SolanaTokenDeployment};

/// USDC mint on Solana mainnet-beta.
pub const USDC_MAINNET_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

/// USDC mint on Solana devnet.
pub const USDC_DEVNET_MINT: &str = "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU";

/// Trait providing convenient methods for well-known Solana clusters.
///
/// # Example
///
/// ```
/// use x402_chain_solana::KnownNetworkSolana;
/// use x402_chain_solana::chain::SolanaNetwork;
///
/// let mainnet = SolanaNetwork::solana_mainnet();
/// assert_eq!(mainnet.to_string(), "solana");
/// ```
pub trait KnownNetworkSolana<A> {
    /// Returns the instance for Solana mainnet-beta (`solana`).
    fn solana_mainnet() -> A;
    /// Returns the instance for Solana devnet (`solana-devnet`).
    fn solana_devnet() -> A;
}

impl KnownNetworkSolana<SolanaNetwork> for SolanaNetwork {
    fn solana_mainnet() -> SolanaNetwork {
        SolanaNetwork::Mainnet
    }

    fn solana_devnet() -> SolanaNetwork {
        SolanaNetwork::Devnet
    }
}

/// Marker type for Circle's USDC SPL token.
pub struct SolanaUSDC;

impl KnownNetworkSolana<SolanaTokenDeployment> for SolanaUSDC {
    fn solana_mainnet() -> SolanaTokenDeployment {
        SolanaTokenDeployment {
            network: SolanaNetwork::Mainnet,
            mint: known_address(USDC_MAINNET_MINT),
            decimals: 6,
        }
    }

    fn solana_devnet() -> SolanaTokenDeployment {
        SolanaTokenDeployment {
            network: SolanaNetwork::Devnet,
            mint: known_address(USDC_DEVNET_MINT),
            decimals: 6,
        }
    }
}

impl SolanaTokenDeployment {
    /// Returns the mainnet USDC deployment.
    pub fn mainnet_usdc() -> Self {
        SolanaUSDC::solana_mainnet()
    }

    /// Returns the devnet USDC deployment.
    pub fn devnet_usdc() -> Self {
        SolanaUSDC::solana_devnet()
    }

    /// Returns the USDC deployment for `network`.
    pub fn usdc(network: SolanaNetwork) -> Self {
        match network {
            SolanaNetwork::Mainnet => Self::mainnet_usdc(),
            SolanaNetwork::Devnet => Self::devnet_usdc(),
        }
    }
}

pub(crate) fn known_address(s: &str) -> SolanaAddress {
    SolanaAddress::from_str(s).expect("hard-coded Solana address is valid base58")
}
