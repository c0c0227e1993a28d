//! Local keypair wallet used by the command-line driver

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use super::{ExecuteTransactionRequest, MessageSigner, TransactionSigner, WalletConnection};
use crate::infrastructure::connection::{serialize_transaction, LedgerConnection};
use crate::shared::errors::{DappError, DappResult};

/// Wallet backed by a keypair on disk. Exposes the direct signing shape and
/// implements execute as sign-then-submit through the connection.
pub struct KeypairWallet {
    keypair: Keypair,
    connection: Arc<dyn LedgerConnection>,
    connected: AtomicBool,
}

impl KeypairWallet {
    pub fn new(keypair: Keypair, connection: Arc<dyn LedgerConnection>) -> Self {
        Self {
            keypair,
            connection,
            connected: AtomicBool::new(false),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P, connection: Arc<dyn LedgerConnection>) -> DappResult<Self> {
        let keypair = read_keypair_file(path.as_ref()).map_err(|e| {
            DappError::Config(format!("Failed to load keypair {}: {}", path.as_ref().display(), e))
        })?;
        Ok(Self::new(keypair, connection))
    }

    fn ensure_connected(&self) -> DappResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(DappError::WalletNotConnected)
        }
    }

    fn sign_in_place(&self, transaction: &mut Transaction) -> DappResult<()> {
        let blockhash = transaction.message.recent_blockhash;
        if blockhash == Hash::default() {
            return Err(DappError::SigningFailure("Transaction has no recent blockhash".to_string()));
        }
        transaction
            .try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| DappError::SigningFailure(e.to_string()))
    }
}

#[async_trait]
impl WalletConnection for KeypairWallet {
    async fn connect(&self) -> DappResult<Pubkey> {
        self.connected.store(true, Ordering::SeqCst);
        info!("Wallet connected: {}", self.keypair.pubkey());
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> DappResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.is_connected().then(|| self.keypair.pubkey())
    }

    async fn execute_transaction(&self, request: ExecuteTransactionRequest) -> DappResult<Signature> {
        self.ensure_connected()?;

        let mut transaction = request.transaction;
        if transaction.message.recent_blockhash == Hash::default() {
            transaction.message.recent_blockhash = self.connection.get_latest_blockhash().await?;
        }
        self.sign_in_place(&mut transaction)?;

        let wire = serialize_transaction(&transaction)?;
        self.connection.send_raw_transaction(&wire).await
    }

    fn transaction_signer(&self) -> Option<&dyn TransactionSigner> {
        Some(self as &dyn TransactionSigner)
    }

    fn message_signer(&self) -> Option<&dyn MessageSigner> {
        Some(self as &dyn MessageSigner)
    }
}

#[async_trait]
impl TransactionSigner for KeypairWallet {
    async fn sign_transaction(&self, mut transaction: Transaction) -> DappResult<Transaction> {
        self.ensure_connected()?;
        self.sign_in_place(&mut transaction)?;
        Ok(transaction)
    }
}

#[async_trait]
impl MessageSigner for KeypairWallet {
    async fn sign_message(&self, message: &[u8]) -> DappResult<Vec<u8>> {
        self.ensure_connected()?;
        Ok(self.keypair.sign_message(message).as_ref().to_vec())
    }
}
