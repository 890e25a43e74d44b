//! Type definitions for the V1 Solana "exact" payment scheme.
//!
//! This module defines the JSON bodies exchanged between a resource server and
//! a paying client, and the `Authorization` credential that carries the proof
//! of payment.

use serde::{Deserialize, Serialize};

/// The x402 protocol version spoken by this scheme.
pub const X402_VERSION: u8 = 1;

/// Scheme/version tag that opens a Solana payment credential.
pub const AUTHORIZATION_SCHEME_TAG: &str = "x402 svm/1";

/// Everything in the `Authorization` header up to the signature itself.
pub const AUTHORIZATION_PREFIX: &str = "x402 svm/1; signature=";

/// Prefix of every challenge `data` token.
pub const DATA_TOKEN_PREFIX: &str = "x402-payment-token-";

/// String literal for the "exact" scheme name.
#[derive(Debug, Clone, Copy)]
pub struct ExactScheme;

impl AsRef<str> for ExactScheme {
    fn as_ref(&self) -> &str {
        "exact"
    }
}

impl std::fmt::Display for ExactScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exact")
    }
}

impl Serialize for ExactScheme {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str("exact")
    }
}

impl<'de> Deserialize<'de> for ExactScheme {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == "exact" {
            Ok(ExactScheme)
        } else {
            Err(serde::de::Error::custom(format!(
                "expected 'exact', got '{s}'"
            )))
        }
    }
}

/// One acceptable way to pay for a resource.
///
/// Addresses and the amount stay as strings on the wire: a challenge may list
/// requirements for chains this crate cannot parse, and those must still
/// deserialize so the client can skip them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirement {
    /// Scheme tag, e.g. `exact`.
    pub scheme: String,
    /// Network name, e.g. `solana`.
    pub network: String,
    /// Amount in the asset's smallest unit, as a decimal integer string.
    pub max_amount_required: String,
    /// Identifier of the protected resource.
    pub resource: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub mime_type: String,
    /// Recipient wallet address.
    pub pay_to: String,
    /// Token mint address.
    pub asset: String,
    /// Single-use correlation token for this challenge.
    #[serde(default)]
    pub data: String,
}

/// The body of an HTTP 402 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentChallenge {
    pub x402_version: u8,
    /// Any one of these suffices.
    pub accepts: Vec<PaymentRequirement>,
    pub error: Option<String>,
}

impl PaymentChallenge {
    /// Creates a version 1 challenge.
    pub fn new(accepts: Vec<PaymentRequirement>, error: Option<String>) -> Self {
        Self {
            x402_version: X402_VERSION,
            accepts,
            error,
        }
    }
}

/// The body of the HTTP 200 response once a proof has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGranted {
    pub message: String,
    pub paid: bool,
    /// Server time of the grant, ISO-8601.
    pub timestamp: String,
    /// The accepted signature, echoed back.
    pub transaction_signature: String,
}

/// A client's evidence of payment, carried in the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaymentProof {
    /// Scheme/version tag, always [`AUTHORIZATION_SCHEME_TAG`] for this scheme.
    pub scheme_tag: String,
    /// Transaction signature (base58 on Solana).
    pub signature: String,
}

impl PaymentProof {
    /// Creates a proof for a transaction signature.
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            scheme_tag: AUTHORIZATION_SCHEME_TAG.to_string(),
            signature: signature.into(),
        }
    }

    /// Parses an `Authorization` header value.
    ///
    /// Returns `None` unless the value starts with [`AUTHORIZATION_PREFIX`]
    /// (case-sensitive) and a non-empty signature follows it.
    pub fn from_authorization_header(value: &str) -> Option<Self> {
        let signature = value.strip_prefix(AUTHORIZATION_PREFIX)?;
        if signature.is_empty() {
            return None;
        }
        Some(Self::new(signature))
    }

    /// Formats the proof as an `Authorization` header value.
    pub fn to_authorization_header(&self) -> String {
        format!("{}; signature={}", self.scheme_tag, self.signature)
    }
}

/// Body of the retried request, tying the proof to the challenge it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryBody {
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_data_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement() -> PaymentRequirement {
        PaymentRequirement {
            scheme: "exact".to_string(),
            network: "solana".to_string(),
            max_amount_required: "10000".to_string(),
            resource: "/api/protected".to_string(),
            description: "Access to protected content".to_string(),
            mime_type: "application/json".to_string(),
            pay_to: "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh".to_string(),
            asset: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
            data: "x402-payment-token-1".to_string(),
        }
    }

    #[test]
    fn test_exact_scheme_serde() {
        let json = serde_json::to_string(&ExactScheme).unwrap();
        assert_eq!(json, "\"exact\"");
        assert!(serde_json::from_str::<ExactScheme>("\"upto\"").is_err());
    }

    #[test]
    fn test_challenge_wire_shape() {
        let challenge = PaymentChallenge::new(vec![requirement()], None);
        let value = serde_json::to_value(&challenge).unwrap();
        assert_eq!(value["x402Version"], 1);
        assert!(value["error"].is_null());
        assert!(value.as_object().unwrap().contains_key("error"));

        let accept = &value["accepts"][0];
        assert_eq!(accept["maxAmountRequired"], "10000");
        assert_eq!(accept["mimeType"], "application/json");
        assert_eq!(accept["payTo"], "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh");
        assert_eq!(accept["data"], "x402-payment-token-1");
    }

    #[test]
    fn test_challenge_tolerates_foreign_requirements() {
        let json = r#"{
            "x402Version": 1,
            "accepts": [{
                "scheme": "exact",
                "network": "base",
                "maxAmountRequired": "10000",
                "resource": "https://example.com/a",
                "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
                "asset": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
            }]
        }"#;
        let challenge: PaymentChallenge = serde_json::from_str(json).unwrap();
        assert_eq!(challenge.accepts[0].network, "base");
        assert!(challenge.accepts[0].data.is_empty());
        assert!(challenge.error.is_none());
    }

    #[test]
    fn test_access_granted_wire_shape() {
        let granted = AccessGranted {
            message: "ok".to_string(),
            paid: true,
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            transaction_signature: "abc123".to_string(),
        };
        let value = serde_json::to_value(&granted).unwrap();
        assert_eq!(value["transactionSignature"], "abc123");
        assert_eq!(value["paid"], true);
    }

    #[test]
    fn test_proof_from_header() {
        let proof = PaymentProof::from_authorization_header("x402 svm/1; signature=abc123").unwrap();
        assert_eq!(proof.signature, "abc123");
        assert_eq!(proof.scheme_tag, AUTHORIZATION_SCHEME_TAG);
    }

    #[test]
    fn test_proof_from_header_rejects() {
        assert!(PaymentProof::from_authorization_header("x402 svm/1; signature=").is_none());
        assert!(PaymentProof::from_authorization_header("Bearer abc123").is_none());
        assert!(PaymentProof::from_authorization_header("X402 SVM/1; signature=abc").is_none());
        assert!(PaymentProof::from_authorization_header("").is_none());
    }

    #[test]
    fn test_proof_header_roundtrip() {
        let proof = PaymentProof::new("5VERv8NMvzbJMEkV8xnrLkEaWRtSz9CosKDYjCJjBRnbJLgp8uirBgmQpjKhoR4tjF3ZpRzrFmBV6UjKdiSZkQUW");
        let header = proof.to_authorization_header();
        assert!(header.starts_with(AUTHORIZATION_PREFIX));
        assert_eq!(PaymentProof::from_authorization_header(&header), Some(proof));
    }

    #[test]
    fn test_retry_body_field_names() {
        let body = RetryBody {
            message: "retry".to_string(),
            payment_data_token: Some("x402-payment-token-1".to_string()),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["payment_data_token"], "x402-payment-token-1");

        let parsed: RetryBody =
            serde_json::from_str(r#"{"message":"Requesting access","requestedBy":"abc"}"#).unwrap();
        assert!(parsed.payment_data_token.is_none());
    }
}
