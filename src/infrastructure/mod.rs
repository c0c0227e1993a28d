//! Infrastructure layer - RPC connection, swap API and NFT program access

pub mod connection;
pub mod nft;
pub mod swap_client;

pub use connection::{Cluster, LedgerConnection, SolanaConnection};
pub use nft::{CandyMachineClient, NftSdk};
pub use swap_client::{JupiterSwapClient, SwapApi};
