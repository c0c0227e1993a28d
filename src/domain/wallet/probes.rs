//! Ordered capability probes over the known wallet shapes

use solana_sdk::transaction::Transaction;
use tracing::debug;

use super::{BatchTransactionSigner, MessageSigner, TransactionSigner, WalletConnection};
use crate::shared::errors::{DappError, DappResult};

/// A location where a wallet may expose a signing method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningProbe {
    /// `wallet.signTransaction`
    Direct,
    /// `wallet.wallet.signTransaction`
    Nested,
    /// `wallet.signAllTransactions` with a one-element batch
    Batch,
}

pub const TRANSACTION_SIGNING_PROBES: [SigningProbe; 3] =
    [SigningProbe::Direct, SigningProbe::Nested, SigningProbe::Batch];

pub const MESSAGE_SIGNING_PROBES: [SigningProbe; 2] = [SigningProbe::Direct, SigningProbe::Nested];

/// The signing capability selected for a wallet.
pub enum ResolvedSigner<'a> {
    Single(SigningProbe, &'a dyn TransactionSigner),
    Batch(&'a dyn BatchTransactionSigner),
}

impl ResolvedSigner<'_> {
    pub fn probe(&self) -> SigningProbe {
        match self {
            ResolvedSigner::Single(probe, _) => *probe,
            ResolvedSigner::Batch(_) => SigningProbe::Batch,
        }
    }

    pub async fn sign(&self, transaction: Transaction) -> DappResult<Transaction> {
        match self {
            ResolvedSigner::Single(_, signer) => signer.sign_transaction(transaction).await,
            ResolvedSigner::Batch(signer) => signer
                .sign_all_transactions(vec![transaction])
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| DappError::SigningFailure("Wallet returned no signed transactions".to_string())),
        }
    }
}

impl SigningProbe {
    fn transaction_signer<'a>(&self, wallet: &'a dyn WalletConnection) -> Option<ResolvedSigner<'a>> {
        match self {
            SigningProbe::Direct => wallet
                .transaction_signer()
                .map(|s| ResolvedSigner::Single(SigningProbe::Direct, s)),
            SigningProbe::Nested => wallet
                .nested_transaction_signer()
                .map(|s| ResolvedSigner::Single(SigningProbe::Nested, s)),
            SigningProbe::Batch => wallet.batch_signer().map(ResolvedSigner::Batch),
        }
    }

    fn message_signer<'a>(&self, wallet: &'a dyn WalletConnection) -> Option<&'a dyn MessageSigner> {
        match self {
            SigningProbe::Direct => wallet.message_signer(),
            SigningProbe::Nested => wallet.nested_message_signer(),
            SigningProbe::Batch => None,
        }
    }
}

/// First transaction signing capability present on the wallet.
pub fn resolve_transaction_signer(wallet: &dyn WalletConnection) -> DappResult<ResolvedSigner<'_>> {
    TRANSACTION_SIGNING_PROBES
        .iter()
        .find_map(|probe| probe.transaction_signer(wallet))
        .ok_or(DappError::UnsupportedWalletShape)
}

/// Sign a transaction with whichever shape the wallet exposes.
pub async fn sign_with_wallet(wallet: &dyn WalletConnection, transaction: Transaction) -> DappResult<Transaction> {
    let signer = resolve_transaction_signer(wallet)?;
    debug!("Signing transaction through {:?} probe", signer.probe());

    signer.sign(transaction).await.map_err(|e| match e {
        DappError::SigningFailure(msg) => DappError::SigningFailure(format!("Signing failed: {}", msg)),
        other => DappError::SigningFailure(format!("Signing failed: {}", other)),
    })
}

/// Sign an arbitrary message with whichever shape the wallet exposes.
pub async fn sign_message_with_wallet(wallet: &dyn WalletConnection, message: &[u8]) -> DappResult<Vec<u8>> {
    let signer = MESSAGE_SIGNING_PROBES
        .iter()
        .find_map(|probe| probe.message_signer(wallet))
        .ok_or(DappError::UnsupportedMessageSigner)?;

    signer.sign_message(message).await
}
