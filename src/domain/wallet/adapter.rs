//! Bridge presenting the wallet's execute entry point as an SDK signing wallet
//!
//! The passkey wallet has no detached `signTransaction`: it signs and submits
//! in one remote call. [`ExecuteTransactionAdapter`] forwards each "sign"
//! request to that call and hands the transaction back without a signature.
//! It reports [`WalletAdapter::executes_on_sign`] so consumers know the
//! returned transaction has already been executed and is not re-submittable.

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    message::Message,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{decompile_instructions, ExecuteTransactionRequest, WalletAdapter, WalletConnection};
use crate::infrastructure::connection::LedgerConnection;
use crate::shared::errors::DappResult;

pub struct ExecuteTransactionAdapter {
    public_key: Pubkey,
    wallet: Arc<dyn WalletConnection>,
    connection: Arc<dyn LedgerConnection>,
    executions: Mutex<Vec<Signature>>,
}

impl ExecuteTransactionAdapter {
    pub fn new(
        public_key: Pubkey,
        wallet: Arc<dyn WalletConnection>,
        connection: Arc<dyn LedgerConnection>,
    ) -> Self {
        Self {
            public_key,
            wallet,
            connection,
            executions: Mutex::new(Vec::new()),
        }
    }

    /// Signatures returned by the wallet for every forwarded transaction, in order.
    pub async fn executed_signatures(&self) -> Vec<Signature> {
        self.executions.lock().await.clone()
    }

    async fn ensure_signable(&self, mut transaction: Transaction) -> DappResult<Transaction> {
        if transaction.message.header.num_required_signatures == 0 {
            // no fee payer compiled in; recompile with the wallet as payer
            let instructions = decompile_instructions(&transaction.message);
            let blockhash = transaction.message.recent_blockhash;
            transaction = Transaction::new_unsigned(Message::new_with_blockhash(
                &instructions,
                Some(&self.public_key),
                &blockhash,
            ));
            debug!("Set fee payer to {}", self.public_key);
        }

        if transaction.message.recent_blockhash == Hash::default() {
            transaction.message.recent_blockhash = self.connection.get_latest_blockhash().await?;
            debug!("Attached blockhash {}", transaction.message.recent_blockhash);
        }

        Ok(transaction)
    }
}

#[async_trait]
impl WalletAdapter for ExecuteTransactionAdapter {
    fn public_key(&self) -> Pubkey {
        self.public_key
    }

    async fn sign_transaction(&self, transaction: Transaction) -> DappResult<Transaction> {
        let transaction = self.ensure_signable(transaction).await?;

        let request = ExecuteTransactionRequest::with_placeholders(transaction.clone(), &self.public_key);
        let signature = self.wallet.execute_transaction(request).await?;

        info!("Wallet executed forwarded transaction: {}", signature);
        self.executions.lock().await.push(signature);

        Ok(transaction)
    }

    async fn sign_all_transactions(&self, transactions: Vec<Transaction>) -> DappResult<Vec<Transaction>> {
        let mut out = Vec::with_capacity(transactions.len());
        for transaction in transactions {
            out.push(self.sign_transaction(transaction).await?);
        }
        Ok(out)
    }

    fn executes_on_sign(&self) -> bool {
        true
    }
}
