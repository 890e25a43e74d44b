//! Configuration types for connecting to a Solana RPC node.
//!
//! This module provides configuration structures used to initialize
//! a Solana chain provider and to bound transfer confirmation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::SolanaNetwork;

/// Default upper bound on waiting for a transfer to reach `confirmed`.
pub const DEFAULT_CONFIRM_TIMEOUT: Duration = Duration::from_secs(60);

/// Default delay between signature status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration for a Solana chain connection.
///
/// Used by [`SolanaRpc`](super::SolanaRpc) implementations and by the
/// client when waiting for a submitted transfer to confirm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolanaChainConfig {
    /// The cluster (`solana` or `solana-devnet`).
    pub network: SolanaNetwork,
    /// The JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// How long to wait for confirmation before giving up.
    #[serde(default = "default_confirm_timeout", with = "duration_secs")]
    pub confirm_timeout: Duration,
    /// How often to poll the signature status while waiting.
    #[serde(default = "default_poll_interval", with = "duration_millis")]
    pub poll_interval: Duration,
}

impl SolanaChainConfig {
    /// Creates a config for `network` using its default public RPC endpoint.
    pub fn for_network(network: SolanaNetwork) -> Self {
        Self {
            network,
            rpc_url: network.default_rpc_url().to_string(),
            confirm_timeout: DEFAULT_CONFIRM_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the RPC endpoint.
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    /// Overrides the confirmation timeout.
    pub fn with_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.confirm_timeout = timeout;
        self
    }

    /// Overrides the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

fn default_confirm_timeout() -> Duration {
    DEFAULT_CONFIRM_TIMEOUT
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
