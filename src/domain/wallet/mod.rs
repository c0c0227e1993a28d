//! Wallet domain - capability contract of the passkey wallet and signing helpers

mod adapter;
mod keypair_wallet;
mod probes;

pub use adapter::ExecuteTransactionAdapter;
pub use keypair_wallet::KeypairWallet;
pub use probes::{
    resolve_transaction_signer, sign_message_with_wallet, sign_with_wallet, ResolvedSigner,
    SigningProbe, MESSAGE_SIGNING_PROBES, TRANSACTION_SIGNING_PROBES,
};

use async_trait::async_trait;
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    message::Message,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};

use crate::shared::errors::DappResult;

#[async_trait]
pub trait TransactionSigner: Send + Sync {
    async fn sign_transaction(&self, transaction: Transaction) -> DappResult<Transaction>;
}

#[async_trait]
pub trait BatchTransactionSigner: Send + Sync {
    async fn sign_all_transactions(&self, transactions: Vec<Transaction>) -> DappResult<Vec<Transaction>>;
}

#[async_trait]
pub trait MessageSigner: Send + Sync {
    /// Raw signature bytes over `message`.
    async fn sign_message(&self, message: &[u8]) -> DappResult<Vec<u8>>;
}

/// Connection and signing surface exposed by the wallet library.
///
/// Wallet implementations differ in where their signing methods live. The
/// optional accessors describe each known location; callers go through
/// [`sign_with_wallet`] which probes them in a fixed order.
#[async_trait]
pub trait WalletConnection: Send + Sync {
    async fn connect(&self) -> DappResult<Pubkey>;

    async fn disconnect(&self) -> DappResult<()>;

    fn is_connected(&self) -> bool;

    fn public_key(&self) -> Option<Pubkey>;

    /// Sign and submit in one remote operation, returning the transaction signature.
    async fn execute_transaction(&self, request: ExecuteTransactionRequest) -> DappResult<Signature>;

    fn transaction_signer(&self) -> Option<&dyn TransactionSigner> {
        None
    }

    /// Signer reachable through the inner `wallet.wallet` object.
    fn nested_transaction_signer(&self) -> Option<&dyn TransactionSigner> {
        None
    }

    fn batch_signer(&self) -> Option<&dyn BatchTransactionSigner> {
        None
    }

    fn message_signer(&self) -> Option<&dyn MessageSigner> {
        None
    }

    fn nested_message_signer(&self) -> Option<&dyn MessageSigner> {
        None
    }
}

/// Signing contract the NFT SDK expects from its wallet.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn public_key(&self) -> Pubkey;

    async fn sign_transaction(&self, transaction: Transaction) -> DappResult<Transaction>;

    async fn sign_all_transactions(&self, transactions: Vec<Transaction>) -> DappResult<Vec<Transaction>>;

    /// `true` when `sign_transaction` already executed the transaction on the
    /// wallet side and hands back a transaction without the wallet signature.
    /// Such a transaction must not be submitted again.
    fn executes_on_sign(&self) -> bool {
        false
    }
}

/// Auxiliary message block accepted by the execute entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteMessage {
    pub nonce: u64,
    pub timestamp: i64,
    pub payload: Vec<u8>,
}

/// Parameters of the wallet's execute-transaction entry point.
#[derive(Debug, Clone)]
pub struct ExecuteTransactionRequest {
    pub transaction: Transaction,
    pub arbitrary_instruction: Option<Instruction>,
    pub pubkey: Option<Vec<u8>>,
    pub signature: Vec<u8>,
    pub message: Option<ExecuteMessage>,
}

impl ExecuteTransactionRequest {
    /// Request carrying only the transaction.
    pub fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            arbitrary_instruction: None,
            pubkey: None,
            signature: Vec::new(),
            message: None,
        }
    }

    /// Request with the fixed placeholder routing fields: first instruction,
    /// signer key bytes, empty signature, nonce 1, current time and empty payload.
    pub fn with_placeholders(transaction: Transaction, signer: &Pubkey) -> Self {
        let arbitrary_instruction = decompile_instruction(&transaction.message, 0);
        Self {
            transaction,
            arbitrary_instruction,
            pubkey: Some(signer.to_bytes().to_vec()),
            signature: Vec::new(),
            message: Some(ExecuteMessage {
                nonce: 1,
                timestamp: chrono::Utc::now().timestamp_millis(),
                payload: Vec::new(),
            }),
        }
    }
}

/// Rebuild the `index`-th instruction of a compiled message.
pub fn decompile_instruction(message: &Message, index: usize) -> Option<Instruction> {
    let compiled = message.instructions.get(index)?;
    let program_id = *message.account_keys.get(compiled.program_id_index as usize)?;

    let accounts = compiled
        .accounts
        .iter()
        .map(|&i| {
            let i = i as usize;
            message.account_keys.get(i).map(|key| AccountMeta {
                pubkey: *key,
                is_signer: is_signer_index(message, i),
                is_writable: is_writable_index(message, i),
            })
        })
        .collect::<Option<Vec<_>>>()?;

    Some(Instruction {
        program_id,
        accounts,
        data: compiled.data.clone(),
    })
}

/// All instructions of a compiled message, in order.
pub fn decompile_instructions(message: &Message) -> Vec<Instruction> {
    (0..message.instructions.len())
        .filter_map(|i| decompile_instruction(message, i))
        .collect()
}

fn is_signer_index(message: &Message, i: usize) -> bool {
    i < message.header.num_required_signatures as usize
}

fn is_writable_index(message: &Message, i: usize) -> bool {
    let header = &message.header;
    let signed = header.num_required_signatures as usize;
    if i < signed {
        i < signed.saturating_sub(header.num_readonly_signed_accounts as usize)
    } else {
        let unsigned_writable_end = message
            .account_keys
            .len()
            .saturating_sub(header.num_readonly_unsigned_accounts as usize);
        i < unsigned_writable_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::system_instruction;

    #[test]
    fn test_decompile_round_trips_transfer() {
        let from = Pubkey::new_unique();
        let to = Pubkey::new_unique();
        let ix = system_instruction::transfer(&from, &to, 42);
        let message = Message::new(&[ix.clone()], Some(&from));

        let decompiled = decompile_instruction(&message, 0).unwrap();
        assert_eq!(decompiled, ix);
        assert!(decompile_instruction(&message, 1).is_none());
    }

    #[test]
    fn test_placeholder_request_fields() {
        let from = Pubkey::new_unique();
        let to = Pubkey::new_unique();
        let ix = system_instruction::transfer(&from, &to, 100);
        let tx = Transaction::new_unsigned(Message::new(&[ix.clone()], Some(&from)));

        let request = ExecuteTransactionRequest::with_placeholders(tx, &from);
        assert_eq!(request.arbitrary_instruction, Some(ix));
        assert_eq!(request.pubkey, Some(from.to_bytes().to_vec()));
        assert!(request.signature.is_empty());

        let message = request.message.unwrap();
        assert_eq!(message.nonce, 1);
        assert!(message.payload.is_empty());
        assert!(message.timestamp > 0);
    }

    #[test]
    fn test_self_transfer_decompiles_destination_as_signer() {
        let from = Pubkey::new_unique();
        let ix = system_instruction::transfer(&from, &from, 100);
        let message = Message::new(&[ix], Some(&from));

        // both metas collapse onto the single fee-payer key
        let decompiled = decompile_instruction(&message, 0).unwrap();
        assert_eq!(decompiled.accounts.len(), 2);
        assert!(decompiled.accounts.iter().all(|meta| meta.pubkey == from));
        assert!(decompiled.accounts.iter().all(|meta| meta.is_signer && meta.is_writable));
    }
}
