//! Resource server guarding an endpoint behind x402 Solana payment challenges.
//!
//! Unpaid requests to the protected resource receive HTTP 402 with a JSON
//! challenge; requests carrying `Authorization: x402 svm/1; signature=<sig>`
//! are verified and answered with the protected content.
//!
//! # Endpoints
//!
//! - `POST /api/protected` - The protected resource (path set by `X402_RESOURCE`)
//! - `GET  /`              - Service description and the current price
//! - `GET  /health`        - Health check
//!
//! # Configuration
//!
//! - `BIND_ADDR`       - Listen address; overrides `HOST`/`PORT`
//! - `PORT`            - Server port (default: 3000)
//! - `HOST`            - Bind address (default: 0.0.0.0)
//! - `X402_NETWORK`    - `solana` or `solana-devnet` (default: solana)
//! - `X402_PAY_TO`     - Recipient wallet
//! - `X402_ASSET`      - SPL mint (default: USDC on the selected network)
//! - `X402_ASSET_DECIMALS` - Decimals of a custom `X402_ASSET` (default: 6)
//! - `X402_AMOUNT`     - Price in base units (default: 10000)
//! - `X402_RESOURCE`   - Protected path (default: /api/protected)
//! - `X402_DESCRIPTION` - Description shown in the challenge
//! - `X402_VERIFIER`   - `stub` or `onchain` (default: stub)
//! - `SOLANA_RPC_URL`  - RPC endpoint used by the `onchain` verifier

mod config;

use axum::extract::{DefaultBodyLimit, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use std::env;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use x402_chain_solana::V1SolanaExact;
use x402_chain_solana::v1_solana_exact::{
    AcceptNonEmptyVerifier, InMemoryProofStore, Paywall, ProofStore, Verifier,
};

use crate::config::{ServerConfig, VerifierKind};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // LOG_LEVEL is used if RUST_LOG is not set
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let store: Arc<dyn ProofStore> = Arc::new(InMemoryProofStore::new());
    let verifier = build_verifier(&config, store.clone())?;

    tracing::info!(
        scheme = %V1SolanaExact.id(),
        network = %config.paywall.token.network,
        asset = %config.paywall.token.mint,
        pay_to = %config.paywall.pay_to,
        amount = config.paywall.amount,
        resource = %config.paywall.resource,
        verifier = ?config.verifier,
        "x402 resource server starting"
    );

    let paywall = Arc::new(Paywall::new(config.paywall.clone(), verifier, store));
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Listening on {}", config.bind_address);

    axum::serve(listener, app(paywall))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn build_verifier(
    config: &ServerConfig,
    store: Arc<dyn ProofStore>,
) -> Result<Arc<dyn Verifier>, Box<dyn std::error::Error>> {
    match config.verifier {
        VerifierKind::Stub => {
            tracing::warn!("Using the stub verifier: any non-empty signature is accepted");
            Ok(Arc::new(AcceptNonEmptyVerifier))
        }
        #[cfg(feature = "onchain")]
        VerifierKind::Onchain => {
            use x402_chain_solana::chain::{SolanaChainConfig, SolanaChainProvider};
            use x402_chain_solana::v1_solana_exact::OnchainVerifier;

            let chain = SolanaChainConfig::for_network(config.paywall.token.network)
                .with_rpc_url(config.rpc_url.clone());
            let provider = SolanaChainProvider::from_config(&chain);
            tracing::info!(rpc_url = %provider.rpc_url(), "Verifying payments on-chain");
            Ok(Arc::new(OnchainVerifier::new(provider, store)))
        }
        #[cfg(not(feature = "onchain"))]
        VerifierKind::Onchain => {
            drop(store);
            Err("X402_VERIFIER=onchain requires building with the `onchain` feature".into())
        }
    }
}

/// Builds the full application router around `paywall`.
fn app(paywall: Arc<Paywall>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(paywall.clone())
        .merge(paywall.router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(64 * 1024)),
        )
}

/// Waits for a Ctrl-C signal to initiate graceful shutdown.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}

async fn root_handler(State(paywall): State<Arc<Paywall>>) -> impl IntoResponse {
    let config = paywall.config();
    Json(serde_json::json!({
        "service": "x402-solana-server",
        "version": env!("CARGO_PKG_VERSION"),
        "x402Version": V1SolanaExact.x402_version(),
        "network": config.token.network,
        "scheme": V1SolanaExact.scheme(),
        "resource": config.resource,
        "asset": config.token.mint,
        "payTo": config.pay_to,
        "maxAmountRequired": config.amount.to_string(),
    }))
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;
    use x402_chain_solana::v1_solana_exact::PaywallConfig;

    fn test_app() -> (Router, InMemoryProofStore) {
        let store = InMemoryProofStore::new();
        let paywall = Arc::new(Paywall::with_stub_verifier(
            PaywallConfig::default(),
            Arc::new(store.clone()),
        ));
        (app(paywall), store)
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn protected(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/protected")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder
            .body(Body::from(r#"{"message":"Requesting access to protected content"}"#))
            .unwrap()
    }

    #[tokio::test]
    async fn test_unpaid_request_gets_challenge() {
        let (app, _) = test_app();
        let response = app.oneshot(protected(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);

        let body = json_body(response).await;
        assert_eq!(body["x402Version"], 1);
        assert!(body["error"].is_null());
        let accepts = body["accepts"].as_array().unwrap();
        assert_eq!(accepts.len(), 1);
        assert_eq!(accepts[0]["scheme"], "exact");
        assert_eq!(accepts[0]["network"], "solana");
        assert_eq!(accepts[0]["maxAmountRequired"], "10000");
        assert_eq!(accepts[0]["asset"], "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v");
        assert_eq!(accepts[0]["payTo"], "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh");
        assert!(
            accepts[0]["data"]
                .as_str()
                .unwrap()
                .starts_with("x402-payment-token-")
        );
    }

    #[tokio::test]
    async fn test_paid_request_gets_content() {
        let (app, store) = test_app();
        let response = app
            .oneshot(protected(Some("x402 svm/1; signature=abc123")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["message"], "Protected content accessed successfully!");
        assert_eq!(body["paid"], true);
        assert_eq!(body["transactionSignature"], "abc123");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
        assert!(store.has_seen("abc123").await);
    }

    #[tokio::test]
    async fn test_wrong_prefix_gets_challenge() {
        let (app, _) = test_app();
        for value in ["Bearer abc123", "X402 svm/1; signature=abc123", "x402 svm/1; signature="] {
            let response = app.clone().oneshot(protected(Some(value))).await.unwrap();
            assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED, "{value}");
        }
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let (app, _) = test_app();
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["network"], "solana");
        assert_eq!(body["maxAmountRequired"], "10000");

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
