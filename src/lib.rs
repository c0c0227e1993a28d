//! Passkey dApp - Solana transfers, candy machine mints and Jupiter swaps
//! driven through a passkey smart wallet
//! Built with Domain-Driven Design principles

pub mod domain;
pub mod infrastructure;
pub mod application;
pub mod shared;

// Re-export main types for convenience
pub use domain::transactions::TransactionBuilder;
pub use domain::wallet::{ExecuteTransactionAdapter, KeypairWallet, WalletAdapter, WalletConnection};
pub use infrastructure::{CandyMachineClient, JupiterSwapClient, SolanaConnection};
pub use shared::errors::{DappError, DappResult};
