//! Bookkeeping of payment proofs a server has accepted.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Storage for accepted payment signatures.
///
/// Inserts are idempotent. Implementations backed by a durable store must
/// make `record_proof` atomic so two concurrent requests cannot both observe
/// a signature as new.
#[async_trait]
pub trait ProofStore: Send + Sync {
    /// Records `signature`. Returns `true` if it was not present before.
    async fn record_proof(&self, signature: &str) -> bool;

    /// Returns whether `signature` has been recorded.
    async fn has_seen(&self, signature: &str) -> bool;
}

/// Process-local [`ProofStore`]. Cloning yields another handle to the same set.
///
/// Entries are never evicted and are lost on restart.
#[derive(Clone, Default, Debug)]
pub struct InMemoryProofStore {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl InMemoryProofStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct signatures recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[async_trait]
impl ProofStore for InMemoryProofStore {
    async fn record_proof(&self, signature: &str) -> bool {
        self.inner.lock().insert(signature.to_string())
    }

    async fn has_seen(&self, signature: &str) -> bool {
        self.inner.lock().contains(signature)
    }
}
