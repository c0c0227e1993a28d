//! In-memory wallet and ledger fakes for controller tests

use async_trait::async_trait;
use solana_sdk::{
    account::Account,
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::wallet::{
    BatchTransactionSigner, ExecuteTransactionRequest, MessageSigner, SigningProbe, TransactionSigner,
    WalletConnection,
};
use crate::infrastructure::connection::LedgerConnection;
use crate::shared::errors::{DappError, DappResult};

pub struct FakeLedger {
    balance: Result<u64, String>,
    accounts: HashMap<Pubkey, Account>,
    blockhash: Hash,
    balance_calls: AtomicUsize,
    calls: AtomicUsize,
    sent: Mutex<Vec<Vec<u8>>>,
}

impl Default for FakeLedger {
    fn default() -> Self {
        Self::with_balance(0)
    }
}

impl FakeLedger {
    pub fn with_balance(lamports: u64) -> Self {
        Self {
            balance: Ok(lamports),
            accounts: HashMap::new(),
            blockhash: Hash::new_unique(),
            balance_calls: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_balance(reason: &str) -> Self {
        Self {
            balance: Err(reason.to_string()),
            ..Self::with_balance(0)
        }
    }

    pub fn with_account(mut self, address: Pubkey, account: Account) -> Self {
        self.accounts.insert(address, account);
        self
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    /// Every ledger call made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|wire| bincode::deserialize(wire).unwrap())
            .collect()
    }
}

#[async_trait]
impl LedgerConnection for FakeLedger {
    async fn get_balance(&self, _owner: &Pubkey) -> DappResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.balance.clone().map_err(DappError::NetworkFailure)
    }

    async fn get_latest_blockhash(&self) -> DappResult<Hash> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.blockhash)
    }

    async fn get_account(&self, address: &Pubkey) -> DappResult<Option<Account>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.accounts.get(address).cloned())
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> DappResult<Signature> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tx: Transaction = bincode::deserialize(wire).map_err(|e| DappError::NetworkFailure(e.to_string()))?;
        self.sent.lock().unwrap().push(wire.to_vec());
        Ok(tx.signatures[0])
    }
}

pub struct KeySigner {
    keypair: Keypair,
}

impl KeySigner {
    fn sign(&self, mut transaction: Transaction) -> DappResult<Transaction> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| DappError::SigningFailure(e.to_string()))?;
        Ok(transaction)
    }
}

#[async_trait]
impl TransactionSigner for KeySigner {
    async fn sign_transaction(&self, transaction: Transaction) -> DappResult<Transaction> {
        self.sign(transaction)
    }
}

#[async_trait]
impl BatchTransactionSigner for KeySigner {
    async fn sign_all_transactions(&self, transactions: Vec<Transaction>) -> DappResult<Vec<Transaction>> {
        transactions.into_iter().map(|tx| self.sign(tx)).collect()
    }
}

#[async_trait]
impl MessageSigner for KeySigner {
    async fn sign_message(&self, message: &[u8]) -> DappResult<Vec<u8>> {
        Ok(self.keypair.sign_message(message).as_ref().to_vec())
    }
}

/// Wallet exposing its signer at a single probe location, or nowhere.
pub struct FakeWallet {
    shape: Option<SigningProbe>,
    signer: KeySigner,
    connected: AtomicBool,
    execute_error: Option<String>,
    pub requests: Mutex<Vec<ExecuteTransactionRequest>>,
}

impl FakeWallet {
    fn with_shape(shape: Option<SigningProbe>) -> Self {
        Self {
            shape,
            signer: KeySigner { keypair: Keypair::new() },
            connected: AtomicBool::new(false),
            execute_error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn direct() -> Self {
        Self::with_shape(Some(SigningProbe::Direct))
    }

    pub fn nested() -> Self {
        Self::with_shape(Some(SigningProbe::Nested))
    }

    pub fn shapeless() -> Self {
        Self::with_shape(None)
    }

    pub fn failing_execute(mut self, reason: &str) -> Self {
        self.execute_error = Some(reason.to_string());
        self
    }

    pub fn connected(self) -> Self {
        self.connected.store(true, Ordering::SeqCst);
        self
    }

    pub fn pubkey(&self) -> Pubkey {
        self.signer.keypair.pubkey()
    }
}

#[async_trait]
impl WalletConnection for FakeWallet {
    async fn connect(&self) -> DappResult<Pubkey> {
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.pubkey())
    }

    async fn disconnect(&self) -> DappResult<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn public_key(&self) -> Option<Pubkey> {
        self.is_connected().then(|| self.pubkey())
    }

    async fn execute_transaction(&self, request: ExecuteTransactionRequest) -> DappResult<Signature> {
        if let Some(reason) = &self.execute_error {
            return Err(DappError::SigningFailure(reason.clone()));
        }
        self.requests.lock().unwrap().push(request);
        Ok(Signature::new_unique())
    }

    fn transaction_signer(&self) -> Option<&dyn TransactionSigner> {
        (self.shape == Some(SigningProbe::Direct)).then_some(&self.signer as &dyn TransactionSigner)
    }

    fn nested_transaction_signer(&self) -> Option<&dyn TransactionSigner> {
        (self.shape == Some(SigningProbe::Nested)).then_some(&self.signer as &dyn TransactionSigner)
    }

    fn batch_signer(&self) -> Option<&dyn BatchTransactionSigner> {
        (self.shape == Some(SigningProbe::Batch)).then_some(&self.signer as &dyn BatchTransactionSigner)
    }

    fn message_signer(&self) -> Option<&dyn MessageSigner> {
        (self.shape == Some(SigningProbe::Direct)).then_some(&self.signer as &dyn MessageSigner)
    }

    fn nested_message_signer(&self) -> Option<&dyn MessageSigner> {
        (self.shape == Some(SigningProbe::Nested)).then_some(&self.signer as &dyn MessageSigner)
    }
}
