//! Wire format types for Solana chain interactions.
//!
//! This module provides types that handle serialization and deserialization
//! of Solana-specific values in the x402 protocol wire format.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use solana_pubkey::Pubkey;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The namespace used when identifying the Solana scheme family.
pub const SOLANA_NAMESPACE: &str = "solana";

/// Default public RPC endpoint for Solana mainnet-beta.
pub const MAINNET_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Default public RPC endpoint for Solana devnet.
pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

// ============================================================================
// SolanaAddress
// ============================================================================

/// A Solana public key that serializes as a base58 string.
///
/// Used for wallet owners, token mints, and token-holding accounts alike.
///
/// # Example
///
/// ```
/// use x402_chain_solana::chain::SolanaAddress;
///
/// let addr: SolanaAddress = "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh".parse().unwrap();
/// assert_eq!(addr.to_string(), "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh");
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct SolanaAddress(Pubkey);

impl SolanaAddress {
    /// Wraps a raw public key.
    pub const fn new(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }

    /// Returns the underlying public key.
    pub fn pubkey(&self) -> Pubkey {
        self.0
    }
}

impl From<Pubkey> for SolanaAddress {
    fn from(pubkey: Pubkey) -> Self {
        Self(pubkey)
    }
}

impl From<SolanaAddress> for Pubkey {
    fn from(value: SolanaAddress) -> Self {
        value.0
    }
}

impl FromStr for SolanaAddress {
    type Err = SolanaAddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pubkey::from_str(s)
            .map(Self)
            .map_err(|e| SolanaAddressParseError::InvalidBase58 {
                input: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl Display for SolanaAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for SolanaAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SolanaAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error returned when parsing a Solana address.
#[derive(Debug, thiserror::Error)]
pub enum SolanaAddressParseError {
    /// The input is not a valid base58-encoded 32-byte public key.
    #[error("Invalid Solana address '{input}': {reason}")]
    InvalidBase58 { input: String, reason: String },
}

// ============================================================================
// SolanaNetwork
// ============================================================================

/// A Solana cluster as named in x402 v1 payment requirements.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum SolanaNetwork {
    /// Solana mainnet-beta, named `solana`.
    Mainnet,
    /// Solana devnet, named `solana-devnet`.
    Devnet,
}

impl SolanaNetwork {
    /// Returns the x402 v1 network name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SolanaNetwork::Mainnet => "solana",
            SolanaNetwork::Devnet => "solana-devnet",
        }
    }

    /// Returns the default public RPC URL for this cluster.
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            SolanaNetwork::Mainnet => MAINNET_RPC_URL,
            SolanaNetwork::Devnet => DEVNET_RPC_URL,
        }
    }
}

impl Display for SolanaNetwork {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SolanaNetwork {
    type Error = SolanaNetworkFormatError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "solana" => Ok(SolanaNetwork::Mainnet),
            "solana-devnet" => Ok(SolanaNetwork::Devnet),
            _ => Err(SolanaNetworkFormatError::UnknownNetwork(value.to_string())),
        }
    }
}

impl FromStr for SolanaNetwork {
    type Err = SolanaNetworkFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SolanaNetwork::try_from(s)
    }
}

impl Serialize for SolanaNetwork {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SolanaNetwork {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SolanaNetwork::try_from(s.as_str()).map_err(serde::de::Error::custom)
    }
}

/// Error returned when a network name is not a known Solana cluster.
#[derive(Debug, thiserror::Error)]
pub enum SolanaNetworkFormatError {
    #[error("Unknown network {0}, expected solana or solana-devnet")]
    UnknownNetwork(String),
}

// ============================================================================
// SolanaTokenDeployment
// ============================================================================

/// Information about an SPL token mint on a Solana cluster.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SolanaTokenDeployment {
    /// The cluster this mint lives on.
    pub network: SolanaNetwork,
    /// The mint address (token identifier).
    pub mint: SolanaAddress,
    /// Number of decimal places for the token (6 for USDC).
    pub decimals: u8,
}

/// A token amount paired with its deployment information.
#[derive(Debug, Clone)]
pub struct DeployedTokenAmount {
    /// The amount in the token's smallest unit.
    pub amount: u64,
    /// The token deployment this amount refers to.
    pub token: SolanaTokenDeployment,
}

impl SolanaTokenDeployment {
    /// Creates a token amount from a raw value in the token's smallest unit.
    pub fn amount(&self, v: u64) -> DeployedTokenAmount {
        DeployedTokenAmount {
            amount: v,
            token: self.clone(),
        }
    }

    /// Parses a human-readable amount such as `"0.01"` into base units.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is malformed, carries more fractional
    /// digits than the token supports, or overflows u64.
    pub fn parse(&self, v: &str) -> Result<DeployedTokenAmount, AmountParseError> {
        let (whole, frac) = match v.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (v, ""),
        };
        if whole.is_empty() || !is_decimal_digits(whole) {
            return Err(AmountParseError::InvalidFormat(v.to_string()));
        }
        if !frac.is_empty() && !is_decimal_digits(frac) {
            return Err(AmountParseError::InvalidFormat(v.to_string()));
        }

        let frac_len = frac.len() as u32;
        if frac_len > self.decimals as u32 {
            return Err(AmountParseError::TooManyDecimals {
                got: frac_len,
                max: self.decimals,
            });
        }

        let whole_val: u64 = whole.parse().map_err(|_| AmountParseError::Overflow)?;
        let frac_val: u64 = if frac.is_empty() {
            0
        } else {
            frac.parse().map_err(|_| AmountParseError::Overflow)?
        };

        let scale = 10u64.pow(self.decimals as u32);
        let frac_scale = 10u64.pow(self.decimals as u32 - frac_len);

        let total = whole_val
            .checked_mul(scale)
            .and_then(|w| w.checked_add(frac_val.checked_mul(frac_scale)?))
            .ok_or(AmountParseError::Overflow)?;

        Ok(DeployedTokenAmount {
            amount: total,
            token: self.clone(),
        })
    }
}

fn is_decimal_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a `maxAmountRequired` literal into token base units.
///
/// The literal is read as an arbitrary-precision unsigned integer and then
/// narrowed to the `u64` an SPL transfer carries. Signs, whitespace, decimal
/// points and exponents are rejected.
#[cfg(feature = "client")]
pub fn parse_base_units(literal: &str) -> Result<u64, AmountParseError> {
    if literal.is_empty() || !is_decimal_digits(literal) {
        return Err(AmountParseError::InvalidFormat(literal.to_string()));
    }
    let wide = alloy_primitives::U256::from_str_radix(literal, 10)
        .map_err(|_| AmountParseError::Overflow)?;
    u64::try_from(wide).map_err(|_| AmountParseError::Overflow)
}

/// Error returned when parsing a token amount.
#[derive(Debug, thiserror::Error)]
pub enum AmountParseError {
    /// The input string is not a valid number.
    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),
    /// Too many decimal places for the token.
    #[error("Too many decimal places: got {got}, max {max}")]
    TooManyDecimals { got: u32, max: u8 },
    /// The resulting amount does not fit in u64.
    #[error("Amount overflow")]
    Overflow,
}

// ============================================================================
// Tests
// ============================================================================
