//! Payment proof verification for the V1 Solana exact scheme.
//!
//! Two [`Verifier`] implementations are provided:
//!
//! 1. [`AcceptNonEmptyVerifier`]: accepts any non-empty signature without
//!    touching the chain. This is what the demo server runs by default and
//!    what existing demo clients expect.
//! 2. [`OnchainVerifier`]: checks the signature is well formed, has not been
//!    redeemed before, and is confirmed on the chain.

use async_trait::async_trait;
use solana_signature::Signature;
use std::str::FromStr;
use std::sync::Arc;

use crate::chain::{SignatureStatus, SolanaRpc};
use crate::v1_solana_exact::store::ProofStore;
use crate::v1_solana_exact::types::{PaymentProof, PaymentRequirement};

/// Result of checking a proof against a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Accepted,
    Rejected(String),
}

impl Verification {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verification::Accepted)
    }
}

/// Decides whether a payment proof satisfies a requirement.
#[async_trait]
pub trait Verifier: Send + Sync {
    async fn verify(&self, proof: &PaymentProof, requirement: &PaymentRequirement) -> Verification;

    /// Whether an accepted proof may be redeemed only once. When `true`, the
    /// paywall grants access only to the request whose `record_proof` call
    /// inserted the signature.
    fn single_use(&self) -> bool {
        false
    }
}

/// Accepts every proof with a non-empty signature.
///
/// Performs no cryptographic or on-chain check.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptNonEmptyVerifier;

#[async_trait]
impl Verifier for AcceptNonEmptyVerifier {
    async fn verify(&self, proof: &PaymentProof, _requirement: &PaymentRequirement) -> Verification {
        if proof.signature.is_empty() {
            Verification::Rejected("empty signature".to_string())
        } else {
            Verification::Accepted
        }
    }
}

/// Accepts a proof only if its transaction is confirmed on-chain and the
/// signature has not been redeemed before.
///
/// The transaction's instructions are not inspected, so recipient, mint and
/// amount are not matched against the requirement.
pub struct OnchainVerifier<R> {
    rpc: R,
    store: Arc<dyn ProofStore>,
}

impl<R> OnchainVerifier<R> {
    /// Creates a verifier that consults `store` for previously redeemed
    /// signatures. Pass the same store the paywall records into.
    pub fn new(rpc: R, store: Arc<dyn ProofStore>) -> Self {
        Self { rpc, store }
    }
}

#[async_trait]
impl<R> Verifier for OnchainVerifier<R>
where
    R: SolanaRpc,
{
    fn single_use(&self) -> bool {
        true
    }

    async fn verify(&self, proof: &PaymentProof, requirement: &PaymentRequirement) -> Verification {
        let signature = match Signature::from_str(&proof.signature) {
            Ok(signature) => signature,
            Err(e) => return Verification::Rejected(format!("malformed signature: {e}")),
        };

        if self.store.has_seen(&proof.signature).await {
            return Verification::Rejected("signature already redeemed".to_string());
        }

        match self.rpc.signature_status(&signature).await {
            Ok(SignatureStatus::Confirmed) => {
                tracing::debug!(
                    %signature,
                    resource = %requirement.resource,
                    "Payment transaction confirmed on-chain"
                );
                Verification::Accepted
            }
            Ok(SignatureStatus::Pending) => {
                Verification::Rejected("transaction not confirmed".to_string())
            }
            Ok(SignatureStatus::Failed(reason)) => {
                Verification::Rejected(format!("transaction failed: {reason}"))
            }
            Err(e) => {
                tracing::warn!(error = %e, %signature, "Signature status lookup failed");
                Verification::Rejected(format!("could not verify transaction: {e}"))
            }
        }
    }
}
