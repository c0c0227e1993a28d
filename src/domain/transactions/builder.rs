//! Ready-to-sign transactions for the supported transfer kinds

use solana_sdk::{
    instruction::Instruction,
    message::Message,
    pubkey::Pubkey,
    system_instruction,
    transaction::Transaction,
};
use spl_token::solana_program::program_pack::Pack;
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::infrastructure::connection::LedgerConnection;
use crate::shared::errors::{DappError, DappResult};
use crate::shared::utils::{parse_address, short_address};

/// Lamports moved by the self-transfer that exercises the signing path.
pub const SELF_TEST_LAMPORTS: u64 = 100;

/// Single system transfer from `identity` back to itself.
pub fn self_test_instructions(identity: &Pubkey) -> Vec<Instruction> {
    vec![system_instruction::transfer(identity, identity, SELF_TEST_LAMPORTS)]
}

pub fn native_transfer_instructions(sender: &Pubkey, recipient: &Pubkey, lamports: u64) -> Vec<Instruction> {
    vec![system_instruction::transfer(sender, recipient, lamports)]
}

/// SPL transfer between the associated token accounts of `sender` and
/// `recipient`, prefixed by a create instruction unless the recipient account
/// is known to exist.
pub fn token_transfer_instructions(
    sender: &Pubkey,
    recipient: &Pubkey,
    mint: &Pubkey,
    amount: u64,
    recipient_account_exists: bool,
) -> DappResult<Vec<Instruction>> {
    let source = get_associated_token_address(sender, mint);
    let destination = get_associated_token_address(recipient, mint);

    let mut instructions = Vec::with_capacity(2);
    if !recipient_account_exists {
        instructions.push(create_associated_token_account(
            sender,
            recipient,
            mint,
            &spl_token::id(),
        ));
    }

    let transfer = spl_token::instruction::transfer(
        &spl_token::id(),
        &source,
        &destination,
        sender,
        &[],
        amount,
    )
    .map_err(|e| DappError::InputValidation(format!("Failed to build token transfer: {}", e)))?;
    instructions.push(transfer);

    Ok(instructions)
}

/// Builds unsigned transactions against an injected connection.
pub struct TransactionBuilder {
    connection: Arc<dyn LedgerConnection>,
}

impl TransactionBuilder {
    pub fn new(connection: Arc<dyn LedgerConnection>) -> Self {
        Self { connection }
    }

    pub async fn build_self_test_transfer(&self, identity: &Pubkey) -> DappResult<Transaction> {
        self.finalize(&self_test_instructions(identity), identity).await
    }

    pub async fn build_native_transfer(
        &self,
        sender: &Pubkey,
        recipient_address: &str,
        lamports: u64,
    ) -> DappResult<Transaction> {
        let recipient = parse_address(recipient_address)?;
        info!("Building SOL transfer of {} lamports to {}", lamports, short_address(&recipient));

        self.finalize(&native_transfer_instructions(sender, &recipient, lamports), sender)
            .await
    }

    pub async fn build_token_transfer(
        &self,
        sender: &Pubkey,
        recipient_address: &str,
        mint_address: &str,
        amount: u64,
    ) -> DappResult<Transaction> {
        let recipient = parse_address(recipient_address)?;
        let mint = parse_address(mint_address)?;

        let destination = get_associated_token_address(&recipient, &mint);
        let exists = match self.connection.get_account(&destination).await {
            Ok(account) => account.is_some(),
            Err(e) => {
                warn!(
                    "Lookup of token account {} failed, creating it: {}",
                    short_address(&destination),
                    e
                );
                false
            }
        };
        debug!("Recipient token account {} exists: {}", short_address(&destination), exists);

        let instructions = token_transfer_instructions(sender, &recipient, &mint, amount, exists)?;
        info!(
            "Building token transfer of {} units of {} ({} instructions)",
            amount,
            short_address(&mint),
            instructions.len()
        );

        self.finalize(&instructions, sender).await
    }

    /// Decimals of an SPL mint, read from its account.
    pub async fn mint_decimals(&self, mint_address: &str) -> DappResult<u8> {
        let mint = parse_address(mint_address)?;
        let account = self
            .connection
            .get_account(&mint)
            .await?
            .ok_or_else(|| DappError::InputValidation(format!("Token mint {} not found", mint)))?;

        let state = spl_token::state::Mint::unpack(&account.data)
            .map_err(|e| DappError::InputValidation(format!("Account {} is not a token mint: {}", mint, e)))?;
        Ok(state.decimals)
    }

    /// Attach a fresh blockhash and the fee payer.
    async fn finalize(&self, instructions: &[Instruction], fee_payer: &Pubkey) -> DappResult<Transaction> {
        let blockhash = self.connection.get_latest_blockhash().await?;
        let message = Message::new_with_blockhash(instructions, Some(fee_payer), &blockhash);
        Ok(Transaction::new_unsigned(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use solana_sdk::{
        account::Account, hash::Hash, signature::Signature, system_program,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Copy)]
    enum Lookup {
        Exists,
        Missing,
        Fails,
    }

    struct FakeConnection {
        lookup: Lookup,
        calls: AtomicUsize,
        blockhash: Hash,
    }

    impl FakeConnection {
        fn new(lookup: Lookup) -> Arc<Self> {
            Arc::new(Self {
                lookup,
                calls: AtomicUsize::new(0),
                blockhash: Hash::new_unique(),
            })
        }
    }

    #[async_trait]
    impl LedgerConnection for FakeConnection {
        async fn get_balance(&self, _owner: &Pubkey) -> DappResult<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(0)
        }

        async fn get_latest_blockhash(&self) -> DappResult<Hash> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.blockhash)
        }

        async fn get_account(&self, _address: &Pubkey) -> DappResult<Option<Account>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.lookup {
                Lookup::Exists => Ok(Some(Account::new(2_039_280, 165, &spl_token::id()))),
                Lookup::Missing => Ok(None),
                Lookup::Fails => Err(DappError::NetworkFailure("rpc timeout".to_string())),
            }
        }

        async fn send_raw_transaction(&self, _wire: &[u8]) -> DappResult<Signature> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Signature::default())
        }
    }

    #[tokio::test]
    async fn test_native_transfer_sets_payer_and_blockhash() {
        let connection = FakeConnection::new(Lookup::Missing);
        let builder = TransactionBuilder::new(connection.clone());
        let sender = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();

        let tx = builder
            .build_native_transfer(&sender, &recipient.to_string(), 10_000_000)
            .await
            .unwrap();

        assert_eq!(tx.message.account_keys[0], sender);
        assert_eq!(tx.message.header.num_required_signatures, 1);
        assert_eq!(tx.message.recent_blockhash, connection.blockhash);
        assert_ne!(tx.message.recent_blockhash, Hash::default());
        assert_eq!(tx.message.instructions.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_recipient_fails_before_network() {
        let connection = FakeConnection::new(Lookup::Missing);
        let builder = TransactionBuilder::new(connection.clone());
        let sender = Pubkey::new_unique();

        let err = builder
            .build_native_transfer(&sender, "definitely not an address", 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::shared::errors::ErrorKind::InputValidation);

        let err = builder
            .build_token_transfer(&sender, "0OIl", &Pubkey::new_unique().to_string(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DappError::InvalidAddress { .. }));

        assert_eq!(connection.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_token_transfer_creates_missing_account() {
        let builder = TransactionBuilder::new(FakeConnection::new(Lookup::Missing));
        let sender = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let tx = builder
            .build_token_transfer(&sender, &recipient.to_string(), &mint.to_string(), 5)
            .await
            .unwrap();

        assert_eq!(tx.message.instructions.len(), 2);
        let create_program = tx.message.program_id(0).unwrap();
        let transfer_program = tx.message.program_id(1).unwrap();
        assert_eq!(*create_program, spl_associated_token_account::id());
        assert_eq!(*transfer_program, spl_token::id());
        assert_eq!(tx.message.account_keys[0], sender);
    }

    #[tokio::test]
    async fn test_token_transfer_skips_existing_account() {
        let builder = TransactionBuilder::new(FakeConnection::new(Lookup::Exists));
        let sender = Pubkey::new_unique();

        let tx = builder
            .build_token_transfer(
                &sender,
                &Pubkey::new_unique().to_string(),
                &Pubkey::new_unique().to_string(),
                5,
            )
            .await
            .unwrap();

        assert_eq!(tx.message.instructions.len(), 1);
        assert_eq!(*tx.message.program_id(0).unwrap(), spl_token::id());
    }

    #[tokio::test]
    async fn test_token_transfer_lookup_failure_creates_account() {
        let builder = TransactionBuilder::new(FakeConnection::new(Lookup::Fails));
        let sender = Pubkey::new_unique();

        let tx = builder
            .build_token_transfer(
                &sender,
                &Pubkey::new_unique().to_string(),
                &Pubkey::new_unique().to_string(),
                5,
            )
            .await
            .unwrap();

        assert_eq!(tx.message.instructions.len(), 2);
    }

    #[test]
    fn test_self_test_transfer_targets_sender() {
        let identity = Pubkey::new_unique();
        let instructions = self_test_instructions(&identity);

        assert_eq!(instructions.len(), 1);
        let ix = &instructions[0];
        assert_eq!(ix.program_id, system_program::id());
        assert_eq!(ix.accounts[0].pubkey, identity);
        assert_eq!(ix.accounts[1].pubkey, identity);
        assert_eq!(ix.accounts[0].pubkey, ix.accounts[1].pubkey);
    }

    #[test]
    fn test_token_transfer_uses_associated_accounts() {
        let sender = Pubkey::new_unique();
        let recipient = Pubkey::new_unique();
        let mint = Pubkey::new_unique();

        let instructions = token_transfer_instructions(&sender, &recipient, &mint, 7, true).unwrap();
        let transfer = &instructions[0];
        assert_eq!(transfer.accounts[0].pubkey, get_associated_token_address(&sender, &mint));
        assert_eq!(transfer.accounts[1].pubkey, get_associated_token_address(&recipient, &mint));
        assert_eq!(transfer.accounts[2].pubkey, sender);
    }

    #[tokio::test]
    async fn test_mint_decimals_reads_mint_account() {
        struct MintConnection;

        #[async_trait]
        impl LedgerConnection for MintConnection {
            async fn get_balance(&self, _owner: &Pubkey) -> DappResult<u64> {
                Ok(0)
            }

            async fn get_latest_blockhash(&self) -> DappResult<Hash> {
                Ok(Hash::new_unique())
            }

            async fn get_account(&self, _address: &Pubkey) -> DappResult<Option<Account>> {
                let mint = spl_token::state::Mint {
                    decimals: 6,
                    is_initialized: true,
                    ..Default::default()
                };
                let mut data = vec![0u8; spl_token::state::Mint::LEN];
                spl_token::state::Mint::pack(mint, &mut data).unwrap();
                Ok(Some(Account {
                    lamports: 1,
                    data,
                    owner: spl_token::id(),
                    executable: false,
                    rent_epoch: 0,
                }))
            }

            async fn send_raw_transaction(&self, _wire: &[u8]) -> DappResult<Signature> {
                Ok(Signature::default())
            }
        }

        let builder = TransactionBuilder::new(Arc::new(MintConnection));
        let decimals = builder
            .mint_decimals(&Pubkey::new_unique().to_string())
            .await
            .unwrap();
        assert_eq!(decimals, 6);
    }
}
