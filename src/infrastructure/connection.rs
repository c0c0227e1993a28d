//! Solana RPC connection shared by every action

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::json;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_request::RpcRequest;
use solana_sdk::{
    account::Account,
    commitment_config::CommitmentConfig,
    hash::Hash,
    pubkey::Pubkey,
    signature::Signature,
    transaction::Transaction,
};
use std::str::FromStr;
use tracing::debug;

use crate::shared::errors::{DappError, DappResult};

/// Network environment the connection points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cluster {
    Devnet,
    Testnet,
    MainnetBeta,
    Custom(String),
}

impl Cluster {
    pub fn url(&self) -> &str {
        match self {
            Cluster::Devnet => "https://api.devnet.solana.com",
            Cluster::Testnet => "https://api.testnet.solana.com",
            Cluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
            Cluster::Custom(url) => url,
        }
    }
}

impl Default for Cluster {
    fn default() -> Self {
        Cluster::Devnet
    }
}

impl FromStr for Cluster {
    type Err = DappError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "devnet" => Ok(Cluster::Devnet),
            "testnet" => Ok(Cluster::Testnet),
            "mainnet" | "mainnet-beta" => Ok(Cluster::MainnetBeta),
            other if other.starts_with("http://") || other.starts_with("https://") => {
                Ok(Cluster::Custom(s.to_string()))
            }
            _ => Err(DappError::Config(format!("Unknown cluster: {}", s))),
        }
    }
}

/// Ledger query and submission contract.
#[async_trait]
pub trait LedgerConnection: Send + Sync {
    /// Balance in lamports.
    async fn get_balance(&self, owner: &Pubkey) -> DappResult<u64>;

    async fn get_latest_blockhash(&self) -> DappResult<Hash>;

    /// `None` when the account does not exist.
    async fn get_account(&self, address: &Pubkey) -> DappResult<Option<Account>>;

    /// Submit a serialized, fully signed transaction.
    async fn send_raw_transaction(&self, wire: &[u8]) -> DappResult<Signature>;
}

/// Serialize a signed transaction into its wire format.
pub fn serialize_transaction(transaction: &Transaction) -> DappResult<Vec<u8>> {
    if !transaction.is_signed() {
        return Err(DappError::SigningFailure(
            "Transaction is missing required signatures".to_string(),
        ));
    }
    bincode::serialize(transaction)
        .map_err(|e| DappError::InputValidation(format!("Failed to serialize transaction: {}", e)))
}

/// RPC-backed connection
pub struct SolanaConnection {
    client: RpcClient,
}

impl SolanaConnection {
    pub fn new(rpc_url: String, commitment: CommitmentConfig) -> Self {
        Self {
            client: RpcClient::new_with_commitment(rpc_url, commitment),
        }
    }
}

#[async_trait]
impl LedgerConnection for SolanaConnection {
    async fn get_balance(&self, owner: &Pubkey) -> DappResult<u64> {
        self.client
            .get_balance(owner)
            .await
            .map_err(|e| DappError::network("Failed to get balance", e))
    }

    async fn get_latest_blockhash(&self) -> DappResult<Hash> {
        self.client
            .get_latest_blockhash()
            .await
            .map_err(|e| DappError::network("Failed to get latest blockhash", e))
    }

    async fn get_account(&self, address: &Pubkey) -> DappResult<Option<Account>> {
        let response = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .await
            .map_err(|e| DappError::network("Failed to get account", e))?;
        Ok(response.value)
    }

    async fn send_raw_transaction(&self, wire: &[u8]) -> DappResult<Signature> {
        let encoded = STANDARD.encode(wire);
        let params = json!([
            encoded,
            {
                "encoding": "base64",
                "preflightCommitment": self.client.commitment().commitment,
            }
        ]);

        let signature: String = self
            .client
            .send(RpcRequest::SendTransaction, params)
            .await
            .map_err(|e| DappError::network("Failed to send transaction", e))?;

        debug!("Submitted transaction {}", signature);

        Signature::from_str(&signature)
            .map_err(|e| DappError::network("Invalid signature returned by RPC", e))
    }
}
