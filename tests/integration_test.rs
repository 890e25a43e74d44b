//! Integration tests for x402-chain-solana.
//!
//! These tests cover the public surface used by servers and clients: scheme
//! identity, known networks, addresses, token amounts, and the JSON shape of
//! challenges and grants.

use x402_chain_solana::chain::{
    SolanaAddress, SolanaChainConfig, SolanaNetwork, SolanaTokenDeployment,
};
use x402_chain_solana::v1_solana_exact::{
    AccessGranted, PaymentChallenge, PaymentProof, PaymentRequirement, RetryBody,
};
use x402_chain_solana::{KnownNetworkSolana, SolanaUSDC, V1SolanaExact};

// ============================================================================
// Scheme Identity Tests
// ============================================================================

#[test]
fn test_v1_solana_exact_scheme_id() {
    let scheme = V1SolanaExact;
    assert_eq!(scheme.namespace(), "solana");
    assert_eq!(scheme.scheme(), "exact");
    assert_eq!(scheme.x402_version(), 1);
    assert_eq!(scheme.id(), "v1-solana-exact");
}

// ============================================================================
// Known Networks Tests
// ============================================================================

#[test]
fn test_known_networks() {
    assert_eq!(SolanaNetwork::solana_mainnet().to_string(), "solana");
    assert_eq!(SolanaNetwork::solana_devnet().to_string(), "solana-devnet");
    assert!("solana-testnet".parse::<SolanaNetwork>().is_err());
}

#[test]
fn test_usdc_deployments() {
    let mainnet = SolanaUSDC::solana_mainnet();
    assert_eq!(mainnet.decimals, 6);
    assert_eq!(mainnet.network, SolanaNetwork::Mainnet);
    assert_eq!(
        mainnet.mint.to_string(),
        "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"
    );

    let devnet = SolanaTokenDeployment::usdc(SolanaNetwork::Devnet);
    assert_eq!(devnet, SolanaUSDC::solana_devnet());
    assert_eq!(
        devnet.mint.to_string(),
        "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU"
    );
}

#[test]
fn test_chain_config_defaults() {
    let config = SolanaChainConfig::for_network(SolanaNetwork::Devnet);
    assert_eq!(config.rpc_url, "https://api.devnet.solana.com");
    assert_eq!(config.confirm_timeout.as_secs(), 60);
    assert_eq!(config.poll_interval.as_millis(), 500);
}

// ============================================================================
// Address Tests
// ============================================================================

#[test]
fn test_solana_address_parse() {
    let address: SolanaAddress = "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh".parse().unwrap();
    assert_eq!(
        address.to_string(),
        "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh"
    );
    assert!("not-base58-0OIl".parse::<SolanaAddress>().is_err());
    assert!("".parse::<SolanaAddress>().is_err());
}

#[test]
fn test_solana_address_serde_json() {
    let address: SolanaAddress = "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh".parse().unwrap();
    let json = serde_json::to_string(&address).unwrap();
    assert_eq!(json, "\"6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh\"");
    let back: SolanaAddress = serde_json::from_str(&json).unwrap();
    assert_eq!(back, address);
}

// ============================================================================
// Token Amount Tests
// ============================================================================

#[test]
fn test_deployed_token_parse_amount() {
    let usdc = SolanaTokenDeployment::mainnet_usdc();
    assert_eq!(usdc.parse("0.01").unwrap().amount, 10_000);
    assert_eq!(usdc.parse("1").unwrap().amount, 1_000_000);
    assert_eq!(usdc.parse("0.000001").unwrap().amount, 1);
    assert!(usdc.parse("0.0000001").is_err());
    assert!(usdc.parse("abc").is_err());
}

// ============================================================================
// Wire Format Tests
// ============================================================================

#[test]
fn test_challenge_json_shape() {
    let json = serde_json::json!({
        "x402Version": 1,
        "accepts": [{
            "scheme": "exact",
            "network": "solana",
            "maxAmountRequired": "10000",
            "resource": "/api/protected",
            "description": "Access to protected content",
            "mimeType": "application/json",
            "payTo": "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh",
            "asset": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
            "data": "x402-payment-token-1700000000000-00"
        }],
        "error": null
    });

    let challenge: PaymentChallenge = serde_json::from_value(json.clone()).unwrap();
    assert_eq!(challenge.x402_version, 1);
    assert_eq!(challenge.accepts.len(), 1);
    assert_eq!(challenge.accepts[0].pay_to, "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh");
    assert_eq!(serde_json::to_value(&challenge).unwrap(), json);
}

#[test]
fn test_foreign_requirements_still_parse() {
    // A server may list options for chains this crate cannot pay on.
    let json = serde_json::json!({
        "scheme": "exact",
        "network": "base",
        "maxAmountRequired": "10000",
        "resource": "/api/protected",
        "mimeType": "application/json",
        "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C",
        "asset": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913"
    });
    let requirement: PaymentRequirement = serde_json::from_value(json).unwrap();
    assert_eq!(requirement.network, "base");
    assert!(requirement.data.is_empty());
}

#[test]
fn test_access_granted_json_shape() {
    let granted = AccessGranted {
        message: "Protected content accessed successfully!".to_string(),
        paid: true,
        timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        transaction_signature: "abc123".to_string(),
    };
    let value = serde_json::to_value(&granted).unwrap();
    assert_eq!(value["transactionSignature"], "abc123");
    assert_eq!(value["paid"], true);
    assert_eq!(value["timestamp"], "2024-01-01T00:00:00.000Z");
}

#[test]
fn test_authorization_header() {
    let proof = PaymentProof::from_authorization_header("x402 svm/1; signature=abc123").unwrap();
    assert_eq!(proof.signature, "abc123");
    assert_eq!(proof.to_authorization_header(), "x402 svm/1; signature=abc123");

    assert!(PaymentProof::from_authorization_header("x402 svm/1; signature=").is_none());
    assert!(PaymentProof::from_authorization_header("x402 SVM/1; signature=abc").is_none());
    assert!(PaymentProof::from_authorization_header("Bearer abc").is_none());
}

#[test]
fn test_retry_body_json_shape() {
    let body = RetryBody {
        message: "Requesting access to protected content via x402".to_string(),
        payment_data_token: Some("x402-payment-token-1-ab".to_string()),
    };
    let value = serde_json::to_value(&body).unwrap();
    assert_eq!(value["payment_data_token"], "x402-payment-token-1-ab");
}

// ============================================================================
// Payment Requirement Tests (server feature)
// ============================================================================

#[cfg(feature = "server")]
mod server_tests {
    use super::*;
    use x402_chain_solana::v1_solana_exact::{PaywallConfig, new_data_token};

    #[test]
    fn test_payment_requirement_fields() {
        let usdc = SolanaTokenDeployment::mainnet_usdc();
        let pay_to: SolanaAddress = "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh".parse().unwrap();
        let requirement = V1SolanaExact::payment_requirement(
            pay_to,
            usdc.amount(10_000),
            "/api/protected",
            "Access to protected content",
        );
        assert_eq!(requirement.scheme, "exact");
        assert_eq!(requirement.network, "solana");
        assert_eq!(requirement.max_amount_required, "10000");
        assert_eq!(requirement.mime_type, "application/json");
        assert_eq!(requirement.asset, usdc.mint.to_string());
        assert!(requirement.data.starts_with("x402-payment-token-"));
    }

    #[test]
    fn test_data_tokens_differ() {
        assert_ne!(new_data_token(), new_data_token());
    }

    #[test]
    fn test_default_paywall_config() {
        let config = PaywallConfig::default();
        assert_eq!(config.amount, 10_000);
        assert_eq!(config.token, SolanaTokenDeployment::mainnet_usdc());
        assert_eq!(config.resource, "/api/protected");
    }
}

// ============================================================================
// Requirement Selection Tests (client feature)
// ============================================================================

#[cfg(feature = "client")]
mod client_tests {
    use super::*;
    use x402_chain_solana::chain::parse_base_units;
    use x402_chain_solana::v1_solana_exact::select_payment_requirements;

    #[test]
    fn test_select_from_challenge() {
        let challenge: PaymentChallenge = serde_json::from_value(serde_json::json!({
            "x402Version": 1,
            "accepts": [
                {
                    "scheme": "exact", "network": "base", "maxAmountRequired": "1",
                    "resource": "/api/protected", "mimeType": "application/json",
                    "payTo": "0x209693Bc6afc0C5328bA36FaF03C514EF312287C", "asset": "0x01"
                },
                {
                    "scheme": "exact", "network": "solana", "maxAmountRequired": "10000",
                    "resource": "/api/protected", "mimeType": "application/json",
                    "payTo": "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh",
                    "asset": "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
                    "data": "x402-payment-token-1-ab"
                }
            ],
            "error": null
        }))
        .unwrap();

        let selected = select_payment_requirements(&challenge.accepts, "solana", "exact").unwrap();
        assert_eq!(selected.data, "x402-payment-token-1-ab");
        assert!(select_payment_requirements(&challenge.accepts, "solana-devnet", "exact").is_err());
    }

    #[test]
    fn test_parse_base_units() {
        assert_eq!(parse_base_units("10000").unwrap(), 10_000);
        assert_eq!(parse_base_units("18446744073709551615").unwrap(), u64::MAX);
        assert!(parse_base_units("18446744073709551616").is_err());
        assert!(parse_base_units("-1").is_err());
        assert!(parse_base_units("1e4").is_err());
        assert!(parse_base_units("").is_err());
    }
}
