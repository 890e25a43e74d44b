//! Server configuration read from environment variables.

use std::str::FromStr;

use x402_chain_solana::chain::{
    SolanaAddress, SolanaAddressParseError, SolanaNetwork, SolanaNetworkFormatError,
    SolanaTokenDeployment,
};
use x402_chain_solana::v1_solana_exact::{
    DEFAULT_AMOUNT, DEFAULT_DESCRIPTION, DEFAULT_PAY_TO, DEFAULT_RESOURCE, PaywallConfig,
};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;

/// How payment credentials are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifierKind {
    /// Any non-empty signature is accepted.
    Stub,
    /// The signature must be confirmed on-chain and not seen before.
    Onchain,
}

impl FromStr for VerifierKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stub" => Ok(VerifierKind::Stub),
            "onchain" => Ok(VerifierKind::Onchain),
            other => Err(ConfigError::UnknownVerifier(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid X402_NETWORK: {0}")]
    Network(#[from] SolanaNetworkFormatError),
    #[error("Invalid X402_PAY_TO: {0}")]
    PayTo(SolanaAddressParseError),
    #[error("Invalid X402_ASSET: {0}")]
    Asset(SolanaAddressParseError),
    #[error("Invalid X402_AMOUNT '{0}': expected a positive integer in base units")]
    Amount(String),
    #[error("Invalid X402_ASSET_DECIMALS '{0}'")]
    Decimals(String),
    #[error("Unknown X402_VERIFIER '{0}', expected stub or onchain")]
    UnknownVerifier(String),
}

/// Everything the server binary needs to start.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub paywall: PaywallConfig,
    pub verifier: VerifierKind,
    pub rpc_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // BIND_ADDR takes precedence over HOST:PORT
        let bind_address = var("BIND_ADDR").unwrap_or_else(|| {
            let port: u16 = var("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT);
            let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
            format!("{host}:{port}")
        });

        let network = match var("X402_NETWORK") {
            Some(name) => SolanaNetwork::from_str(&name)?,
            None => SolanaNetwork::Mainnet,
        };

        let token = match var("X402_ASSET") {
            Some(mint) => {
                let mint = SolanaAddress::from_str(&mint).map_err(ConfigError::Asset)?;
                let decimals = match var("X402_ASSET_DECIMALS") {
                    Some(d) => d.parse().map_err(|_| ConfigError::Decimals(d))?,
                    None => 6,
                };
                SolanaTokenDeployment {
                    network,
                    mint,
                    decimals,
                }
            }
            None => SolanaTokenDeployment::usdc(network),
        };

        let pay_to = var("X402_PAY_TO").unwrap_or_else(|| DEFAULT_PAY_TO.to_string());
        let pay_to = SolanaAddress::from_str(&pay_to).map_err(ConfigError::PayTo)?;

        let amount = match var("X402_AMOUNT") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(amount) if amount > 0 && raw.bytes().all(|b| b.is_ascii_digit()) => amount,
                _ => return Err(ConfigError::Amount(raw)),
            },
            None => DEFAULT_AMOUNT,
        };

        let verifier = match var("X402_VERIFIER") {
            Some(kind) => kind.parse()?,
            None => VerifierKind::Stub,
        };

        Ok(Self {
            bind_address,
            paywall: PaywallConfig {
                token,
                pay_to,
                amount,
                resource: var("X402_RESOURCE").unwrap_or_else(|| DEFAULT_RESOURCE.to_string()),
                description: var("X402_DESCRIPTION")
                    .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            },
            verifier,
            rpc_url: var("SOLANA_RPC_URL")
                .unwrap_or_else(|| network.default_rpc_url().to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert_eq!(config.verifier, VerifierKind::Stub);
        assert_eq!(config.paywall.amount, 10_000);
        assert_eq!(config.paywall.resource, "/api/protected");
        assert_eq!(
            config.paywall.token.mint.to_string(),
            "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
        );
        assert_eq!(config.rpc_url, "https://api.mainnet-beta.solana.com");
    }

    #[test]
    fn test_bind_addr_precedence() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8080");

        let config =
            ServerConfig::from_lookup(lookup(&[("HOST", "127.0.0.1"), ("PORT", "9000")])).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:9000");
    }

    #[test]
    fn test_devnet_uses_devnet_usdc() {
        let config = ServerConfig::from_lookup(lookup(&[("X402_NETWORK", "solana-devnet")]))
            .unwrap();
        assert_eq!(config.paywall.token.network, SolanaNetwork::Devnet);
        assert_eq!(
            config.paywall.token.mint.to_string(),
            "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU"
        );
        assert_eq!(config.rpc_url, "https://api.devnet.solana.com");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("X402_NETWORK", "base")])),
            Err(ConfigError::Network(_))
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("X402_PAY_TO", "0xdeadbeef")])),
            Err(ConfigError::PayTo(_))
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("X402_AMOUNT", "0.01")])),
            Err(ConfigError::Amount(_))
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("X402_AMOUNT", "+5")])),
            Err(ConfigError::Amount(_))
        ));
        assert!(matches!(
            ServerConfig::from_lookup(lookup(&[("X402_VERIFIER", "trust-me")])),
            Err(ConfigError::UnknownVerifier(_))
        ));
    }
}
