//! Passkey authentication screen: message signing and a signed test transaction

use solana_sdk::signature::Signature;
use std::sync::Arc;
use tracing::info;

use super::state::ActionState;
use crate::domain::transactions::TransactionBuilder;
use crate::domain::wallet::{sign_message_with_wallet, sign_with_wallet, WalletConnection};
use crate::infrastructure::connection::{serialize_transaction, LedgerConnection};
use crate::shared::errors::{DappError, DappResult};

pub struct PasskeyAuthController {
    wallet: Arc<dyn WalletConnection>,
    connection: Arc<dyn LedgerConnection>,
    builder: TransactionBuilder,
    message_state: ActionState<String>,
    transaction_state: ActionState<Signature>,
}

impl PasskeyAuthController {
    pub fn new(wallet: Arc<dyn WalletConnection>, connection: Arc<dyn LedgerConnection>) -> Self {
        Self {
            builder: TransactionBuilder::new(connection.clone()),
            wallet,
            connection,
            message_state: ActionState::Idle,
            transaction_state: ActionState::Idle,
        }
    }

    /// Sign `message`; the signature is shown hex-encoded.
    pub async fn sign_message(&mut self, message: &str) {
        if message.is_empty() || !self.wallet.is_connected() {
            self.message_state
                .reject("Please enter a message and connect your wallet");
            return;
        }

        self.message_state.begin();
        match sign_message_with_wallet(self.wallet.as_ref(), message.as_bytes()).await {
            Ok(signature) => self.message_state.succeed(hex::encode(signature)),
            Err(e) => self.message_state.fail("Signing failed", e),
        }
    }

    /// Build the self-transfer, sign it through the wallet probes and submit it.
    pub async fn sign_test_transaction(&mut self) {
        if self.wallet.public_key().is_none() {
            self.transaction_state.reject("Please connect your wallet first");
            return;
        }

        self.transaction_state.begin();
        match self.send_test_transaction().await {
            Ok(signature) => {
                info!("Test transaction submitted: {}", signature);
                self.transaction_state.succeed(signature);
            }
            Err(e) => self.transaction_state.fail("Transaction signing failed", e),
        }
    }

    async fn send_test_transaction(&self) -> DappResult<Signature> {
        let owner = self.wallet.public_key().ok_or(DappError::WalletNotConnected)?;
        let transaction = self.builder.build_self_test_transfer(&owner).await?;
        let signed = sign_with_wallet(self.wallet.as_ref(), transaction).await?;
        let wire = serialize_transaction(&signed)?;
        self.connection.send_raw_transaction(&wire).await
    }

    pub fn message_state(&self) -> &ActionState<String> {
        &self.message_state
    }

    pub fn transaction_state(&self) -> &ActionState<Signature> {
        &self.transaction_state
    }

    pub fn is_busy(&self) -> bool {
        self.message_state.is_busy() || self.transaction_state.is_busy()
    }
}
