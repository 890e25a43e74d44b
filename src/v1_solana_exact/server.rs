//! Server-side challenge issuance and proof handling for the V1 Solana exact scheme.
//!
//! [`Paywall`] guards one resource. Requests without a usable
//! `Authorization: x402 svm/1; signature=<sig>` credential get a fresh 402
//! challenge. Requests with one are passed to the configured [`Verifier`];
//! accepted signatures are recorded in the [`ProofStore`] and answered with 200.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use x402_chain_solana::v1_solana_exact::{InMemoryProofStore, Paywall, PaywallConfig};
//!
//! let paywall = Arc::new(Paywall::with_stub_verifier(
//!     PaywallConfig::default(),
//!     Arc::new(InMemoryProofStore::new()),
//! ));
//! let app = paywall.router();
//! ```

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::V1SolanaExact;
use crate::chain::{DeployedTokenAmount, SolanaAddress, SolanaTokenDeployment};
use crate::networks::known_address;
use crate::v1_solana_exact::store::ProofStore;
use crate::v1_solana_exact::types::{
    AccessGranted, DATA_TOKEN_PREFIX, ExactScheme, PaymentChallenge, PaymentProof,
    PaymentRequirement, RetryBody,
};
use crate::v1_solana_exact::verifier::{AcceptNonEmptyVerifier, Verification, Verifier};

/// Recipient wallet of the demo deployment.
pub const DEFAULT_PAY_TO: &str = "6FFe7xj9fqosbXfFF8SjH89yFqguv5Ah8h4cJMhNPiXh";

/// 0.01 USDC.
pub const DEFAULT_AMOUNT: u64 = 10_000;

pub const DEFAULT_RESOURCE: &str = "/api/protected";

pub const DEFAULT_DESCRIPTION: &str = "Access to protected content";

pub const GRANTED_MESSAGE: &str = "Protected content accessed successfully!";

impl V1SolanaExact {
    /// Creates a payment requirement for `amount` of a token, payable to `pay_to`.
    ///
    /// The `data` token is freshly generated on every call.
    pub fn payment_requirement(
        pay_to: SolanaAddress,
        amount: DeployedTokenAmount,
        resource: impl Into<String>,
        description: impl Into<String>,
    ) -> PaymentRequirement {
        PaymentRequirement {
            scheme: ExactScheme.to_string(),
            network: amount.token.network.to_string(),
            max_amount_required: amount.amount.to_string(),
            resource: resource.into(),
            description: description.into(),
            mime_type: "application/json".to_string(),
            pay_to: pay_to.to_string(),
            asset: amount.token.mint.to_string(),
            data: new_data_token(),
        }
    }
}

static DATA_TOKEN_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates a single-use challenge correlation token.
///
/// Format: `x402-payment-token-<unix-millis>-<32 hex chars>`. The hex part is
/// OS randomness; if that is unavailable a process-wide sequence number is
/// used instead so tokens issued in the same millisecond still differ.
pub fn new_data_token() -> String {
    let millis = Utc::now().timestamp_millis();
    let mut nonce = [0u8; 16];
    if let Err(e) = getrandom::getrandom(&mut nonce) {
        tracing::warn!(error = %e, "OS randomness unavailable, using sequence nonce");
        let sequence = DATA_TOKEN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        nonce[..8].copy_from_slice(&sequence.to_be_bytes());
    }
    format!("{DATA_TOKEN_PREFIX}{millis}-{}", hex::encode(nonce))
}

/// What a [`Paywall`] charges and for what.
#[derive(Debug, Clone)]
pub struct PaywallConfig {
    /// Token mint and the cluster it lives on.
    pub token: SolanaTokenDeployment,
    /// Recipient wallet.
    pub pay_to: SolanaAddress,
    /// Price in the token's smallest unit.
    pub amount: u64,
    /// Path of the protected resource; also the route the router mounts.
    pub resource: String,
    pub description: String,
}

impl Default for PaywallConfig {
    fn default() -> Self {
        Self {
            token: SolanaTokenDeployment::mainnet_usdc(),
            pay_to: known_address(DEFAULT_PAY_TO),
            amount: DEFAULT_AMOUNT,
            resource: DEFAULT_RESOURCE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

/// The two answers a paywall can give.
#[derive(Debug, Clone)]
pub enum PaywallResponse {
    /// HTTP 402 with payment requirements.
    Challenge(PaymentChallenge),
    /// HTTP 200, the proof was accepted.
    Granted(AccessGranted),
}

impl PaywallResponse {
    pub fn status(&self) -> StatusCode {
        match self {
            PaywallResponse::Challenge(_) => StatusCode::PAYMENT_REQUIRED,
            PaywallResponse::Granted(_) => StatusCode::OK,
        }
    }
}

impl IntoResponse for PaywallResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            PaywallResponse::Challenge(challenge) => (status, Json(challenge)).into_response(),
            PaywallResponse::Granted(granted) => (status, Json(granted)).into_response(),
        }
    }
}

/// Guards a single resource behind a payment challenge.
pub struct Paywall {
    config: PaywallConfig,
    verifier: Arc<dyn Verifier>,
    store: Arc<dyn ProofStore>,
}

impl Paywall {
    /// Creates a paywall. The host owns `store` and may share it with the
    /// verifier.
    pub fn new(
        config: PaywallConfig,
        verifier: Arc<dyn Verifier>,
        store: Arc<dyn ProofStore>,
    ) -> Self {
        Self {
            config,
            verifier,
            store,
        }
    }

    /// Creates a paywall that accepts any non-empty signature.
    pub fn with_stub_verifier(config: PaywallConfig, store: Arc<dyn ProofStore>) -> Self {
        Self::new(config, Arc::new(AcceptNonEmptyVerifier), store)
    }

    pub fn config(&self) -> &PaywallConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ProofStore> {
        &self.store
    }

    /// Builds the configured requirement with a fresh `data` token.
    pub fn requirement(&self) -> PaymentRequirement {
        V1SolanaExact::payment_requirement(
            self.config.pay_to,
            self.config.token.amount(self.config.amount),
            self.config.resource.clone(),
            self.config.description.clone(),
        )
    }

    /// Builds a fresh challenge with exactly one requirement.
    pub fn challenge(&self, error: Option<String>) -> PaymentChallenge {
        PaymentChallenge::new(vec![self.requirement()], error)
    }

    /// Handles one request given its `Authorization` header value, if any.
    ///
    /// Missing, malformed, and rejected credentials all produce a challenge.
    pub async fn process(&self, authorization: Option<&str>) -> PaywallResponse {
        let Some(proof) = authorization.and_then(PaymentProof::from_authorization_header) else {
            tracing::debug!(resource = %self.config.resource, "No payment credential, issuing challenge");
            return PaywallResponse::Challenge(self.challenge(None));
        };

        let requirement = self.requirement();
        match self.verifier.verify(&proof, &requirement).await {
            Verification::Accepted => {
                let fresh = self.store.record_proof(&proof.signature).await;
                if !fresh && self.verifier.single_use() {
                    tracing::warn!(
                        signature = %proof.signature,
                        "Payment proof already redeemed, issuing new challenge"
                    );
                    return PaywallResponse::Challenge(PaymentChallenge::new(
                        vec![requirement],
                        Some("signature already redeemed".to_string()),
                    ));
                }
                tracing::info!(
                    signature = %proof.signature,
                    resource = %self.config.resource,
                    first_seen = fresh,
                    "Payment proof accepted"
                );
                PaywallResponse::Granted(AccessGranted {
                    message: GRANTED_MESSAGE.to_string(),
                    paid: true,
                    timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                    transaction_signature: proof.signature,
                })
            }
            Verification::Rejected(reason) => {
                tracing::warn!(
                    signature = %proof.signature,
                    reason = %reason,
                    "Payment proof rejected, issuing new challenge"
                );
                PaywallResponse::Challenge(PaymentChallenge::new(vec![requirement], Some(reason)))
            }
        }
    }

    /// Returns a router serving the protected resource at its configured path.
    pub fn router(self: Arc<Self>) -> Router {
        let path = if self.config.resource.starts_with('/') {
            self.config.resource.clone()
        } else {
            format!("/{}", self.config.resource)
        };
        Router::new()
            .route(&path, post(protected_resource_handler))
            .with_state(self)
    }
}

async fn protected_resource_handler(
    State(paywall): State<Arc<Paywall>>,
    headers: HeaderMap,
    body: Bytes,
) -> PaywallResponse {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if let Ok(RetryBody {
        payment_data_token: Some(token),
        ..
    }) = serde_json::from_slice::<RetryBody>(&body)
    {
        tracing::debug!(payment_data_token = %token, "Retry references challenge token");
    }

    paywall.process(authorization).await
}
