//! NFT minting through Candy Machine Core v3

pub mod candy_machine;

pub use candy_machine::CandyMachine;

use async_trait::async_trait;
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    message::Message,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::wallet::WalletAdapter;
use crate::infrastructure::connection::{serialize_transaction, LedgerConnection};
use crate::shared::errors::{DappError, DappResult};
use candy_machine::{metadata_pda, metadata_update_authority, mint_v2_direct, mint_v2_guarded, MINT_COMPUTE_UNITS};

/// Result of a mint
#[derive(Debug, Clone, PartialEq)]
pub struct MintedNft {
    pub mint: Pubkey,
    /// Set when this SDK submitted the transaction itself
    pub signature: Option<Signature>,
}

#[async_trait]
pub trait NftSdk: Send + Sync {
    async fn find_by_address(&self, address: &Pubkey) -> DappResult<CandyMachine>;

    async fn mint(&self, candy_machine: &CandyMachine, signer: &dyn WalletAdapter) -> DappResult<MintedNft>;
}

/// Candy machine access over the ledger connection
pub struct CandyMachineClient {
    connection: Arc<dyn LedgerConnection>,
}

impl CandyMachineClient {
    pub fn new(connection: Arc<dyn LedgerConnection>) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl NftSdk for CandyMachineClient {
    async fn find_by_address(&self, address: &Pubkey) -> DappResult<CandyMachine> {
        let account = self
            .connection
            .get_account(address)
            .await?
            .ok_or_else(|| DappError::InputValidation(format!("Candy machine {} not found", address)))?;

        let mut candy_machine = CandyMachine::try_deserialize(*address, &account.data)?;

        let collection_metadata = metadata_pda(&candy_machine.collection_mint);
        let metadata = self.connection.get_account(&collection_metadata).await?.ok_or_else(|| {
            DappError::InputValidation(format!(
                "Collection metadata {} not found for candy machine {}",
                collection_metadata, address
            ))
        })?;
        candy_machine.collection_update_authority = metadata_update_authority(&metadata.data)?;

        debug!(
            "Loaded candy machine {}: {}/{} redeemed",
            address, candy_machine.items_redeemed, candy_machine.items_available
        );
        Ok(candy_machine)
    }

    async fn mint(&self, candy_machine: &CandyMachine, signer: &dyn WalletAdapter) -> DappResult<MintedNft> {
        if candy_machine.is_sold_out() {
            return Err(DappError::InputValidation(format!(
                "Candy machine {} is sold out",
                candy_machine.address
            )));
        }

        let minter = signer.public_key();
        let nft_mint = Keypair::new();

        let mint_ix = if candy_machine.mints_directly(&minter) {
            mint_v2_direct(candy_machine, &minter, &nft_mint.pubkey())
        } else {
            mint_v2_guarded(candy_machine, &minter, &nft_mint.pubkey())?
        };
        let instructions = [ComputeBudgetInstruction::set_compute_unit_limit(MINT_COMPUTE_UNITS), mint_ix];

        let blockhash = self.connection.get_latest_blockhash().await?;
        let mut transaction =
            Transaction::new_unsigned(Message::new_with_blockhash(&instructions, Some(&minter), &blockhash));
        transaction
            .try_partial_sign(&[&nft_mint], blockhash)
            .map_err(|e| DappError::SigningFailure(e.to_string()))?;

        info!("Minting {} from candy machine {}", nft_mint.pubkey(), candy_machine.address);
        let transaction = signer.sign_transaction(transaction).await?;

        // an executing signer has already submitted the transaction
        let signature = if signer.executes_on_sign() {
            None
        } else {
            let wire = serialize_transaction(&transaction)?;
            Some(self.connection.send_raw_transaction(&wire).await?)
        };

        Ok(MintedNft {
            mint: nft_mint.pubkey(),
            signature,
        })
    }
}
