//! Client-side payment execution for the V1 Solana "exact" scheme.
//!
//! This module provides [`X402Client`], which pays for an HTTP resource by
//! transferring SPL tokens on Solana and retrying with proof of the transfer.
//!
//! # Payment Flow
//!
//! 1. Client requests the resource and receives a 402 challenge
//! 2. [`select_payment_requirements`] picks the first requirement matching
//!    the client's network and scheme
//! 3. [`execute_transfer`]:
//!    a. Connects the wallet to learn the sender address
//!    b. Derives sender and recipient associated token accounts
//!    c. Adds an account-creation instruction if the recipient's is missing
//!    d. Adds an SPL transfer of exactly `maxAmountRequired` base units
//!    e. Has the wallet sign, submits, and waits for `confirmed`
//! 4. The request is retried with `Authorization: x402 svm/1; signature=<sig>`

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use solana_hash::Hash;
use solana_instruction::Instruction;
use solana_keypair::Keypair;
use solana_message::Message;
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_transaction::Transaction;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::chain::{
    AmountParseError, SignatureStatus, SolanaAddress, SolanaAddressParseError, SolanaChainConfig,
    SolanaProviderError, SolanaRpc, parse_base_units,
};
use crate::v1_solana_exact::types::{
    AccessGranted, ExactScheme, PaymentChallenge, PaymentProof, PaymentRequirement, RetryBody,
};

/// Errors surfaced by a payment attempt.
#[derive(Debug, thiserror::Error)]
pub enum X402ClientError {
    /// No wallet was supplied to the client.
    #[error("Wallet not found. Configure a wallet to continue.")]
    WalletUnavailable,

    /// The wallet connected but exposed no public key.
    #[error("Wallet not connected or public key not available.")]
    WalletNotConnected,

    /// The challenge offered nothing at all.
    #[error("No payment methods accepted")]
    NoPaymentMethods,

    /// The challenge offered nothing on the client's network and scheme.
    #[error("No payment requirement matches network {network} and scheme {scheme}")]
    NoMatchingPaymentRequirement { network: String, scheme: String },

    /// The transfer failed, expired, or did not confirm in time.
    #[error("Transfer not confirmed: {0}")]
    TransferNotConfirmed(String),

    /// The server did not accept the retried request.
    #[error("Payment verification failed: {0}")]
    RetryRejected(u16),

    /// The first response was neither a success nor a 402.
    #[error("HTTP error! status: {0}")]
    UnexpectedStatus(u16),

    /// The 402 or 200 body did not have the expected shape.
    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    InvalidAddress(#[from] SolanaAddressParseError),

    #[error("Invalid maxAmountRequired: {0}")]
    InvalidAmount(#[from] AmountParseError),

    /// An SPL instruction could not be built.
    #[error("Instruction error: {0}")]
    Instruction(String),

    #[error("Signing error: {0}")]
    Signing(String),

    /// The wallet failed for a reason of its own.
    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error(transparent)]
    Provider(#[from] SolanaProviderError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

// ============================================================================
// Requirement selection
// ============================================================================

/// Returns the first requirement whose network and scheme both match exactly.
pub fn select_payment_requirements<'a>(
    accepts: &'a [PaymentRequirement],
    network: &str,
    scheme: &str,
) -> Result<&'a PaymentRequirement, X402ClientError> {
    accepts
        .iter()
        .find(|requirement| requirement.network == network && requirement.scheme == scheme)
        .ok_or_else(|| X402ClientError::NoMatchingPaymentRequirement {
            network: network.to_string(),
            scheme: scheme.to_string(),
        })
}

// ============================================================================
// Wallets
// ============================================================================

/// A wallet that can reveal its address and sign transactions.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Connects to the wallet. `None` means no usable public key.
    async fn connect(&self) -> Result<Option<Pubkey>, X402ClientError>;

    /// Signs `transaction` as its fee payer and returns it.
    async fn sign_transaction(
        &self,
        transaction: Transaction,
    ) -> Result<Transaction, X402ClientError>;
}

/// A wallet backed by a local keypair.
#[derive(Clone)]
pub struct KeypairWallet {
    keypair: Arc<Keypair>,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair: Arc::new(keypair),
        }
    }

    /// Loads a keypair in the Solana CLI format (a JSON array of 64 bytes).
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, X402ClientError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| X402ClientError::Wallet(format!("read {}: {e}", path.display())))?;
        let bytes: Vec<u8> = serde_json::from_str(&contents)
            .map_err(|e| X402ClientError::Wallet(format!("parse {}: {e}", path.display())))?;
        let keypair = Keypair::try_from(bytes.as_slice())
            .map_err(|e| X402ClientError::Wallet(format!("invalid keypair: {e}")))?;
        Ok(Self::new(keypair))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }
}

impl fmt::Debug for KeypairWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeypairWallet")
            .field("pubkey", &self.keypair.pubkey())
            .finish()
    }
}

#[async_trait]
impl WalletProvider for KeypairWallet {
    async fn connect(&self) -> Result<Option<Pubkey>, X402ClientError> {
        Ok(Some(self.keypair.pubkey()))
    }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Transaction, X402ClientError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[self.keypair.as_ref()], blockhash)
            .map_err(|e| X402ClientError::Signing(e.to_string()))?;
        Ok(transaction)
    }
}

// ============================================================================
// Transfer construction
// ============================================================================

/// The accounts and amount of one SPL transfer satisfying a requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub sender: Pubkey,
    pub sender_token_account: Pubkey,
    pub recipient: Pubkey,
    pub recipient_token_account: Pubkey,
    pub mint: Pubkey,
    /// Base units, parsed from `maxAmountRequired`.
    pub amount: u64,
}

impl TransferPlan {
    /// Resolves the accounts involved in paying `requirement` from `sender`.
    pub fn new(sender: Pubkey, requirement: &PaymentRequirement) -> Result<Self, X402ClientError> {
        let recipient: Pubkey = requirement.pay_to.parse::<SolanaAddress>()?.into();
        let mint: Pubkey = requirement.asset.parse::<SolanaAddress>()?.into();
        let amount = parse_base_units(&requirement.max_amount_required)?;

        Ok(Self {
            sender,
            sender_token_account: spl_associated_token_account::get_associated_token_address(
                &sender, &mint,
            ),
            recipient,
            recipient_token_account: spl_associated_token_account::get_associated_token_address(
                &recipient, &mint,
            ),
            mint,
            amount,
        })
    }

    /// Builds the instructions: an idempotent creation of the recipient's
    /// token account when it does not exist yet, then the transfer.
    pub fn instructions(
        &self,
        recipient_account_exists: bool,
    ) -> Result<Vec<Instruction>, X402ClientError> {
        let mut instructions = Vec::with_capacity(2);
        if !recipient_account_exists {
            instructions.push(
                spl_associated_token_account::instruction::create_associated_token_account_idempotent(
                    &self.sender,
                    &self.recipient,
                    &self.mint,
                    &spl_token::id(),
                ),
            );
        }
        let transfer = spl_token::instruction::transfer(
            &spl_token::id(),
            &self.sender_token_account,
            &self.recipient_token_account,
            &self.sender,
            &[],
            self.amount,
        )
        .map_err(|e| X402ClientError::Instruction(format!("SPL transfer: {e:?}")))?;
        instructions.push(transfer);
        Ok(instructions)
    }

    /// Builds the unsigned transaction with the sender as fee payer.
    pub fn transaction(
        &self,
        recipient_account_exists: bool,
        recent_blockhash: Hash,
    ) -> Result<Transaction, X402ClientError> {
        let instructions = self.instructions(recipient_account_exists)?;
        let message =
            Message::new_with_blockhash(&instructions, Some(&self.sender), &recent_blockhash);
        Ok(Transaction::new_unsigned(message))
    }
}

/// Builds the transfer instructions paying `requirement` from `sender`.
pub fn build_transfer_instructions(
    sender: Pubkey,
    requirement: &PaymentRequirement,
    recipient_account_exists: bool,
) -> Result<Vec<Instruction>, X402ClientError> {
    TransferPlan::new(sender, requirement)?.instructions(recipient_account_exists)
}

/// A wallet-signed transfer ready for submission.
#[derive(Debug, Clone)]
pub struct SignedTransfer {
    pub transaction: Transaction,
    /// Last block height at which the transaction's blockhash is valid.
    pub last_valid_block_height: u64,
    pub plan: TransferPlan,
}

impl SignedTransfer {
    /// The fee payer's signature, which identifies the transaction.
    pub fn signature(&self) -> Signature {
        self.transaction.signatures.first().copied().unwrap_or_default()
    }
}

/// Builds a transfer satisfying `requirement` and has the wallet sign it.
pub async fn sign_transfer<W, R>(
    requirement: &PaymentRequirement,
    wallet: Option<&W>,
    rpc: &R,
) -> Result<SignedTransfer, X402ClientError>
where
    W: WalletProvider + ?Sized,
    R: SolanaRpc + ?Sized,
{
    let wallet = wallet.ok_or(X402ClientError::WalletUnavailable)?;
    let sender = wallet
        .connect()
        .await?
        .ok_or(X402ClientError::WalletNotConnected)?;

    let plan = TransferPlan::new(sender, requirement)?;
    let recipient_account_exists = rpc.account_exists(&plan.recipient_token_account).await?;
    let (blockhash, last_valid_block_height) = rpc.latest_blockhash().await?;
    let transaction = plan.transaction(recipient_account_exists, blockhash)?;

    tracing::debug!(
        sender = %plan.sender,
        recipient = %plan.recipient,
        mint = %plan.mint,
        amount = plan.amount,
        create_recipient_account = !recipient_account_exists,
        "Requesting wallet signature"
    );

    let transaction = wallet.sign_transaction(transaction).await?;
    if !transaction.is_signed() {
        return Err(X402ClientError::Signing(
            "wallet returned an unsigned transaction".to_string(),
        ));
    }

    Ok(SignedTransfer {
        transaction,
        last_valid_block_height,
        plan,
    })
}

// ============================================================================
// Confirmation
// ============================================================================

/// How waiting for a submitted transaction ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed,
    TimedOut,
    Rejected(String),
}

/// Polls `signature` until it is confirmed, fails, its blockhash expires,
/// or `timeout` elapses. Dropping the future cancels the wait.
pub async fn wait_for_confirmation<R>(
    rpc: &R,
    signature: &Signature,
    last_valid_block_height: u64,
    timeout: Duration,
    poll_interval: Duration,
) -> ConfirmationOutcome
where
    R: SolanaRpc + ?Sized,
{
    let poll = async {
        loop {
            match rpc.signature_status(signature).await {
                Ok(SignatureStatus::Confirmed) => return ConfirmationOutcome::Confirmed,
                Ok(SignatureStatus::Failed(reason)) => {
                    return ConfirmationOutcome::Rejected(reason);
                }
                Ok(SignatureStatus::Pending) => match rpc.block_height().await {
                    Ok(height) if height > last_valid_block_height => {
                        return ConfirmationOutcome::Rejected(format!(
                            "blockhash expired at block height {last_valid_block_height}"
                        ));
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!(error = %e, "Block height lookup failed"),
                },
                Err(e) => {
                    tracing::warn!(error = %e, %signature, "Signature status lookup failed");
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
    };

    match tokio::time::timeout(timeout, poll).await {
        Ok(outcome) => outcome,
        Err(_) => ConfirmationOutcome::TimedOut,
    }
}

/// Submits a signed transfer and waits for it to confirm.
pub async fn submit_and_confirm<R>(
    transfer: &SignedTransfer,
    rpc: &R,
    config: &SolanaChainConfig,
) -> Result<Signature, X402ClientError>
where
    R: SolanaRpc + ?Sized,
{
    let signature = rpc.send_transaction(&transfer.transaction).await?;
    tracing::info!(%signature, "Transfer submitted, awaiting confirmation");
    confirm(rpc, &signature, transfer.last_valid_block_height, config).await?;
    Ok(signature)
}

async fn confirm<R>(
    rpc: &R,
    signature: &Signature,
    last_valid_block_height: u64,
    config: &SolanaChainConfig,
) -> Result<(), X402ClientError>
where
    R: SolanaRpc + ?Sized,
{
    match wait_for_confirmation(
        rpc,
        signature,
        last_valid_block_height,
        config.confirm_timeout,
        config.poll_interval,
    )
    .await
    {
        ConfirmationOutcome::Confirmed => Ok(()),
        ConfirmationOutcome::TimedOut => Err(X402ClientError::TransferNotConfirmed(format!(
            "{signature} not confirmed within {:?}",
            config.confirm_timeout
        ))),
        ConfirmationOutcome::Rejected(reason) => {
            Err(X402ClientError::TransferNotConfirmed(format!("{signature}: {reason}")))
        }
    }
}

/// Pays `requirement` on-chain and returns the confirmed transaction signature.
pub async fn execute_transfer<W, R>(
    requirement: &PaymentRequirement,
    wallet: Option<&W>,
    rpc: &R,
    config: &SolanaChainConfig,
) -> Result<Signature, X402ClientError>
where
    W: WalletProvider + ?Sized,
    R: SolanaRpc + ?Sized,
{
    let transfer = sign_transfer(requirement, wallet, rpc).await?;
    submit_and_confirm(&transfer, rpc, config).await
}

// ============================================================================
// Orchestration
// ============================================================================

/// States of a single payment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentAttemptState {
    Idle,
    AwaitingChallenge,
    ChallengeReceived,
    RequirementSelected,
    TransferSubmitted,
    TransferConfirmed,
    RetrySent,
    Accepted,
    Failed(String),
}

impl fmt::Display for PaymentAttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentAttemptState::Idle => f.write_str("idle"),
            PaymentAttemptState::AwaitingChallenge => f.write_str("awaiting_challenge"),
            PaymentAttemptState::ChallengeReceived => f.write_str("challenge_received"),
            PaymentAttemptState::RequirementSelected => f.write_str("requirement_selected"),
            PaymentAttemptState::TransferSubmitted => f.write_str("transfer_submitted"),
            PaymentAttemptState::TransferConfirmed => f.write_str("transfer_confirmed"),
            PaymentAttemptState::RetrySent => f.write_str("retry_sent"),
            PaymentAttemptState::Accepted => f.write_str("accepted"),
            PaymentAttemptState::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Records the states an attempt passes through.
#[derive(Debug)]
struct AttemptTrail {
    states: Vec<PaymentAttemptState>,
}

impl AttemptTrail {
    fn new() -> Self {
        Self {
            states: vec![PaymentAttemptState::Idle],
        }
    }

    fn advance(&mut self, next: PaymentAttemptState) {
        if let Some(from) = self.states.last() {
            tracing::debug!(%from, to = %next, "Payment attempt transition");
        }
        self.states.push(next);
    }
}

/// A resource obtained by paying for it.
#[derive(Debug, Clone)]
pub struct PaidAccess {
    /// The server's 200 body.
    pub response: AccessGranted,
    /// The requirement that was paid.
    pub requirement: PaymentRequirement,
    /// Signature of the confirmed transfer.
    pub transaction_signature: Signature,
    /// Every state the attempt passed through, ending in `Accepted`.
    pub states: Vec<PaymentAttemptState>,
}

/// Result of [`X402Client::fetch`].
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// The server answered without asking for payment.
    NotRequired(serde_json::Value),
    Paid(PaidAccess),
}

/// Pays for HTTP resources guarded by x402 Solana challenges.
///
/// Each call to [`fetch`](Self::fetch) is one independent attempt. A failed
/// attempt is never retried; calling again starts over with a new challenge.
///
/// # Example
///
/// ```ignore
/// use x402_chain_solana::chain::{SolanaChainConfig, SolanaChainProvider, SolanaNetwork};
/// use x402_chain_solana::v1_solana_exact::{KeypairWallet, X402Client};
///
/// let config = SolanaChainConfig::for_network(SolanaNetwork::Mainnet);
/// let provider = SolanaChainProvider::from_config(&config);
/// let wallet = KeypairWallet::from_json_file("id.json")?;
/// let client = X402Client::new(Some(wallet), provider, config);
/// let outcome = client.fetch("http://localhost:3000/api/protected", &body).await?;
/// ```
pub struct X402Client<W, R> {
    http: reqwest::Client,
    wallet: Option<W>,
    rpc: R,
    chain: SolanaChainConfig,
}

impl<W, R> X402Client<W, R>
where
    W: WalletProvider,
    R: SolanaRpc,
{
    pub fn new(wallet: Option<W>, rpc: R, chain: SolanaChainConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            wallet,
            rpc,
            chain,
        }
    }

    /// Replaces the HTTP client used for both requests.
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn chain(&self) -> &SolanaChainConfig {
        &self.chain
    }

    /// POSTs `body` to `url`, paying if the server answers 402.
    pub async fn fetch(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<PaymentOutcome, X402ClientError> {
        let mut trail = AttemptTrail::new();
        let result = self.run(url, body, &mut trail).await;
        if let Err(e) = &result {
            trail.advance(PaymentAttemptState::Failed(e.to_string()));
            tracing::warn!(error = %e, url, "Payment attempt failed");
        }
        result
    }

    async fn run(
        &self,
        url: &str,
        body: &serde_json::Value,
        trail: &mut AttemptTrail,
    ) -> Result<PaymentOutcome, X402ClientError> {
        trail.advance(PaymentAttemptState::AwaitingChallenge);
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();

        if status != StatusCode::PAYMENT_REQUIRED {
            if !status.is_success() {
                return Err(X402ClientError::UnexpectedStatus(status.as_u16()));
            }
            let bytes = response.bytes().await?;
            let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
            tracing::info!(url, "Resource served without payment");
            return Ok(PaymentOutcome::NotRequired(value));
        }

        let bytes = response.bytes().await?;
        let challenge: PaymentChallenge = serde_json::from_slice(&bytes)
            .map_err(|e| X402ClientError::InvalidResponse(format!("402 body: {e}")))?;
        trail.advance(PaymentAttemptState::ChallengeReceived);
        tracing::info!(
            version = challenge.x402_version,
            error = ?challenge.error,
            accepts_count = challenge.accepts.len(),
            "Received 402 Payment Required"
        );

        if challenge.accepts.is_empty() {
            return Err(X402ClientError::NoPaymentMethods);
        }
        let requirement = select_payment_requirements(
            &challenge.accepts,
            self.chain.network.as_str(),
            ExactScheme.as_ref(),
        )?
        .clone();
        trail.advance(PaymentAttemptState::RequirementSelected);

        let transfer = sign_transfer(&requirement, self.wallet.as_ref(), &self.rpc).await?;
        let signature = self.rpc.send_transaction(&transfer.transaction).await?;
        trail.advance(PaymentAttemptState::TransferSubmitted);
        confirm(
            &self.rpc,
            &signature,
            transfer.last_valid_block_height,
            &self.chain,
        )
        .await?;
        trail.advance(PaymentAttemptState::TransferConfirmed);

        let proof = PaymentProof::new(signature.to_string());
        let retry_body = RetryBody {
            message: "Requesting access to protected content via x402".to_string(),
            payment_data_token: Some(requirement.data.clone()),
        };
        let response = self
            .http
            .post(url)
            .header(AUTHORIZATION, proof.to_authorization_header())
            .json(&retry_body)
            .send()
            .await?;
        trail.advance(PaymentAttemptState::RetrySent);

        let status = response.status();
        if !status.is_success() {
            return Err(X402ClientError::RetryRejected(status.as_u16()));
        }
        let bytes = response.bytes().await?;
        let granted: AccessGranted = serde_json::from_slice(&bytes)
            .map_err(|e| X402ClientError::InvalidResponse(format!("200 body: {e}")))?;
        trail.advance(PaymentAttemptState::Accepted);
        tracing::info!(
            %signature,
            echoed = %granted.transaction_signature,
            "x402 payment accepted"
        );

        Ok(PaymentOutcome::Paid(PaidAccess {
            response: granted,
            requirement,
            transaction_signature: signature,
            states: std::mem::take(&mut trail.states),
        }))
    }
}
