//! Common types used across the application

use serde::{Deserialize, Serialize};

use crate::shared::errors::DappError;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
pub const SOL_DECIMALS: u8 = 9;

/// Token registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    pub address: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl TokenDescriptor {
    pub fn label(&self) -> String {
        format!("{} - {}", self.symbol, self.name)
    }
}

/// Transaction kinds offered on the transaction screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionKind {
    #[default]
    Test,
    Sol,
    Token,
    Nft,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Test => "Test Transaction",
            TransactionKind::Sol => "SOL Transfer",
            TransactionKind::Token => "Token Transfer",
            TransactionKind::Nft => "Mint NFT",
        }
    }

    /// Prefix used when an action of this kind fails.
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            TransactionKind::Test => "Transaction failed",
            TransactionKind::Sol => "SOL transfer failed",
            TransactionKind::Token => "Token transfer failed",
            TransactionKind::Nft => "NFT minting failed",
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = DappError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test" => Ok(TransactionKind::Test),
            "sol" => Ok(TransactionKind::Sol),
            "token" | "spl" => Ok(TransactionKind::Token),
            "nft" => Ok(TransactionKind::Nft),
            _ => Err(DappError::InputValidation(format!("Unknown transaction type: {}", s))),
        }
    }
}
