//! Candy Machine Core v3 account layout and `mint_v2` instruction builders

use borsh::{BorshDeserialize, BorshSerialize};
use solana_sdk::{
    hash::hash,
    instruction::{AccountMeta, Instruction},
    pubkey,
    pubkey::Pubkey,
    system_program, sysvar,
};
use spl_associated_token_account::get_associated_token_address;

use crate::shared::errors::{DappError, DappResult};

pub const CANDY_MACHINE_PROGRAM_ID: Pubkey = pubkey!("CndyV3LdqHUfDLmE5naZjVN8rBZz4tqhdefbAnjHG3JR");
pub const CANDY_GUARD_PROGRAM_ID: Pubkey = pubkey!("Guard1JwRhJkVH6XZhzoYxeBVQe872VH6QggF4BWmS9g");
pub const TOKEN_METADATA_PROGRAM_ID: Pubkey = pubkey!("metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s");

/// Token standard value of programmable NFTs
pub const PROGRAMMABLE_NON_FUNGIBLE: u8 = 4;

/// Compute units requested for a mint; `mint_v2` exceeds the 200k default.
pub const MINT_COMPUTE_UNITS: u32 = 800_000;

/// Anchor account discriminator: first 8 bytes of sha256("account:<Name>")
pub fn account_discriminator(name: &str) -> [u8; 8] {
    anchor_discriminator("account", name)
}

/// Anchor instruction discriminator: first 8 bytes of sha256("global:<name>")
pub fn instruction_discriminator(name: &str) -> [u8; 8] {
    anchor_discriminator("global", name)
}

fn anchor_discriminator(namespace: &str, name: &str) -> [u8; 8] {
    let digest = hash(format!("{}:{}", namespace, name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest.to_bytes()[..8]);
    out
}

/// Leading fields of a `CandyMachine` account, up to `is_mutable`.
/// Creators and the optional settings that follow are not read.
#[derive(BorshDeserialize, Debug, Clone)]
struct CandyMachineHeader {
    discriminator: [u8; 8],
    _version: u8,
    token_standard: u8,
    _features: [u8; 6],
    authority: [u8; 32],
    mint_authority: [u8; 32],
    collection_mint: [u8; 32],
    items_redeemed: u64,
    items_available: u64,
    symbol: String,
    seller_fee_basis_points: u16,
    max_supply: u64,
    is_mutable: bool,
}

/// Decoded candy machine with what the mint instruction needs
#[derive(Debug, Clone, PartialEq)]
pub struct CandyMachine {
    pub address: Pubkey,
    pub authority: Pubkey,
    /// Candy guard address when a guard wraps the machine
    pub mint_authority: Pubkey,
    pub collection_mint: Pubkey,
    pub collection_update_authority: Pubkey,
    pub token_standard: u8,
    pub items_redeemed: u64,
    pub items_available: u64,
    pub symbol: String,
    pub seller_fee_basis_points: u16,
    pub max_supply: u64,
    pub is_mutable: bool,
}

impl CandyMachine {
    /// Decode account data. `collection_update_authority` is left as default
    /// until the collection metadata is read.
    pub fn try_deserialize(address: Pubkey, data: &[u8]) -> DappResult<Self> {
        let expected = account_discriminator("CandyMachine");
        if data.len() < 8 || data[..8] != expected {
            return Err(DappError::InputValidation(format!(
                "Account {} is not a candy machine",
                address
            )));
        }

        let header = CandyMachineHeader::deserialize(&mut &data[..]).map_err(|e| {
            DappError::InputValidation(format!("Malformed candy machine account {}: {}", address, e))
        })?;
        debug_assert_eq!(header.discriminator, expected);

        Ok(Self {
            address,
            authority: Pubkey::new_from_array(header.authority),
            mint_authority: Pubkey::new_from_array(header.mint_authority),
            collection_mint: Pubkey::new_from_array(header.collection_mint),
            collection_update_authority: Pubkey::default(),
            token_standard: header.token_standard,
            items_redeemed: header.items_redeemed,
            items_available: header.items_available,
            symbol: header.symbol.trim_end_matches('\0').to_string(),
            seller_fee_basis_points: header.seller_fee_basis_points,
            max_supply: header.max_supply,
            is_mutable: header.is_mutable,
        })
    }

    pub fn items_remaining(&self) -> u64 {
        self.items_available.saturating_sub(self.items_redeemed)
    }

    pub fn is_sold_out(&self) -> bool {
        self.items_remaining() == 0
    }

    pub fn is_programmable(&self) -> bool {
        self.token_standard == PROGRAMMABLE_NON_FUNGIBLE
    }

    /// Whether `minter` may mint without going through the guard.
    pub fn mints_directly(&self, minter: &Pubkey) -> bool {
        self.mint_authority == *minter
    }
}

/// Update authority stored in a token metadata account (bytes 1..33).
pub fn metadata_update_authority(data: &[u8]) -> DappResult<Pubkey> {
    data.get(1..33)
        .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
        .map(Pubkey::new_from_array)
        .ok_or_else(|| DappError::InputValidation("Collection metadata account is too short".to_string()))
}

pub fn metadata_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[b"metadata", TOKEN_METADATA_PROGRAM_ID.as_ref(), mint.as_ref()],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}

pub fn master_edition_pda(mint: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[b"metadata", TOKEN_METADATA_PROGRAM_ID.as_ref(), mint.as_ref(), b"edition"],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}

pub fn token_record_pda(mint: &Pubkey, token: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(
        &[
            b"metadata",
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            mint.as_ref(),
            b"token_record",
            token.as_ref(),
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}

pub fn collection_delegate_record_pda(
    collection_mint: &Pubkey,
    collection_update_authority: &Pubkey,
    delegate: &Pubkey,
) -> Pubkey {
    Pubkey::find_program_address(
        &[
            b"metadata",
            TOKEN_METADATA_PROGRAM_ID.as_ref(),
            collection_mint.as_ref(),
            b"collection_delegate",
            collection_update_authority.as_ref(),
            delegate.as_ref(),
        ],
        &TOKEN_METADATA_PROGRAM_ID,
    )
    .0
}

/// PDA the candy machine signs with when creating the collection item.
pub fn authority_pda(candy_machine: &Pubkey) -> Pubkey {
    Pubkey::find_program_address(&[b"candy_machine", candy_machine.as_ref()], &CANDY_MACHINE_PROGRAM_ID).0
}

#[derive(BorshSerialize, Debug, Default)]
struct GuardMintArgs {
    mint_args: Vec<u8>,
    label: Option<String>,
}

/// Accounts shared by the direct and guarded `mint_v2` variants, in program order.
fn item_accounts(candy_machine: &CandyMachine, minter: &Pubkey, nft_mint: &Pubkey, program: &Pubkey) -> Vec<AccountMeta> {
    let token = get_associated_token_address(minter, nft_mint);
    let token_record = if candy_machine.is_programmable() {
        AccountMeta::new(token_record_pda(nft_mint, &token), false)
    } else {
        // unused optional accounts are passed as the invoked program id
        AccountMeta::new_readonly(*program, false)
    };
    let cm_authority = authority_pda(&candy_machine.address);

    vec![
        AccountMeta::new(*nft_mint, true),
        AccountMeta::new_readonly(*minter, true),
        AccountMeta::new(metadata_pda(nft_mint), false),
        AccountMeta::new(master_edition_pda(nft_mint), false),
        AccountMeta::new(token, false),
        token_record,
        AccountMeta::new_readonly(
            collection_delegate_record_pda(
                &candy_machine.collection_mint,
                &candy_machine.collection_update_authority,
                &cm_authority,
            ),
            false,
        ),
        AccountMeta::new_readonly(candy_machine.collection_mint, false),
        AccountMeta::new(metadata_pda(&candy_machine.collection_mint), false),
        AccountMeta::new_readonly(master_edition_pda(&candy_machine.collection_mint), false),
        AccountMeta::new_readonly(candy_machine.collection_update_authority, false),
        AccountMeta::new_readonly(TOKEN_METADATA_PROGRAM_ID, false),
        AccountMeta::new_readonly(spl_token::id(), false),
        AccountMeta::new_readonly(spl_associated_token_account::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
        AccountMeta::new_readonly(sysvar::instructions::id(), false),
        AccountMeta::new_readonly(sysvar::slot_hashes::id(), false),
        AccountMeta::new_readonly(*program, false),
        AccountMeta::new_readonly(*program, false),
    ]
}

/// `mint_v2` on Candy Machine Core; `minter` must be the mint authority.
pub fn mint_v2_direct(candy_machine: &CandyMachine, minter: &Pubkey, nft_mint: &Pubkey) -> Instruction {
    let mut accounts = vec![
        AccountMeta::new(candy_machine.address, false),
        AccountMeta::new(authority_pda(&candy_machine.address), false),
        AccountMeta::new_readonly(*minter, true),
        AccountMeta::new(*minter, true),
        AccountMeta::new_readonly(*minter, false),
    ];
    accounts.extend(item_accounts(candy_machine, minter, nft_mint, &CANDY_MACHINE_PROGRAM_ID));

    Instruction {
        program_id: CANDY_MACHINE_PROGRAM_ID,
        accounts,
        data: instruction_discriminator("mint_v2").to_vec(),
    }
}

/// `mint_v2` through the candy guard named by the machine's mint authority.
pub fn mint_v2_guarded(candy_machine: &CandyMachine, minter: &Pubkey, nft_mint: &Pubkey) -> DappResult<Instruction> {
    let mut accounts = vec![
        AccountMeta::new_readonly(candy_machine.mint_authority, false),
        AccountMeta::new_readonly(CANDY_MACHINE_PROGRAM_ID, false),
        AccountMeta::new(candy_machine.address, false),
        AccountMeta::new(authority_pda(&candy_machine.address), false),
        AccountMeta::new(*minter, true),
        AccountMeta::new(*minter, true),
    ];
    accounts.extend(item_accounts(candy_machine, minter, nft_mint, &CANDY_GUARD_PROGRAM_ID));

    let mut data = instruction_discriminator("mint_v2").to_vec();
    let args = GuardMintArgs::default()
        .try_to_vec()
        .map_err(|e| DappError::InputValidation(format!("Failed to encode mint args: {}", e)))?;
    data.extend(args);

    Ok(Instruction {
        program_id: CANDY_GUARD_PROGRAM_ID,
        accounts,
        data,
    })
}
