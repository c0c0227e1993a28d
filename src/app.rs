// src/app.rs
use anyhow::{anyhow, Result};
use solana_sdk::{commitment_config::CommitmentConfig, signature::Keypair};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use passkey_dapp::application::{CommandExecutor, Commands};
use passkey_dapp::domain::wallet::{KeypairWallet, WalletConnection};
use passkey_dapp::infrastructure::{
    Cluster, CandyMachineClient, JupiterSwapClient, LedgerConnection, NftSdk, SolanaConnection, SwapApi,
};

use crate::config::Config;

#[derive(Debug, Clone, PartialEq)]
pub struct AppCfg {
    pub rpc_url: String,
    pub commitment: String,
    pub keypair_path: Option<String>,
    pub quote_api_url: String,
    pub token_list_url: String,
    pub slippage_bps: u16,
}

impl AppCfg {
    pub fn from_config(cfg: Config) -> Result<Self> {
        let cluster = Cluster::from_str(&cfg.network.cluster)?;
        let rpc_url = cfg.network.rpc_url.unwrap_or_else(|| cluster.url().to_string());

        Ok(Self {
            rpc_url,
            commitment: cfg.network.commitment,
            keypair_path: cfg.wallet.keypair,
            quote_api_url: cfg.swap.quote_api_url,
            token_list_url: cfg.swap.token_list_url,
            slippage_bps: cfg.swap.slippage_bps,
        })
    }

    /// CLI values win over the file: `--rpc-url` over `--cluster` over config.
    pub fn apply_overrides(
        &mut self,
        rpc_url: Option<String>,
        cluster: Option<&str>,
        keypair: Option<String>,
    ) -> Result<()> {
        if let Some(cluster) = cluster {
            self.rpc_url = Cluster::from_str(cluster)?.url().to_string();
        }
        if let Some(rpc_url) = rpc_url {
            self.rpc_url = rpc_url;
        }
        if let Some(keypair) = keypair {
            self.keypair_path = Some(keypair);
        }
        Ok(())
    }

    /// Configured keypair, or the Solana CLI default location.
    pub fn resolved_keypair_path(&self) -> Result<String> {
        let path = match &self.keypair_path {
            Some(path) => path.clone(),
            None => "~/.config/solana/id.json".to_string(),
        };
        match path.strip_prefix("~/") {
            Some(rest) => {
                let home = std::env::var("HOME").map_err(|_| anyhow!("HOME is not set, cannot expand {}", path))?;
                Ok(format!("{}/{}", home, rest))
            }
            None => Ok(path),
        }
    }
}

pub async fn run(app_cfg: AppCfg, command: Commands) -> Result<()> {
    info!("RPC endpoint: {}", app_cfg.rpc_url);

    let commitment = CommitmentConfig::from_str(&app_cfg.commitment)
        .map_err(|e| anyhow!("Invalid commitment {}: {:?}", app_cfg.commitment, e))?;
    let connection: Arc<dyn LedgerConnection> =
        Arc::new(SolanaConnection::new(app_cfg.rpc_url.clone(), commitment));

    let wallet: Arc<dyn WalletConnection> = if command.requires_wallet() {
        let path = app_cfg.resolved_keypair_path()?;
        info!("Loading keypair from {}", path);
        Arc::new(KeypairWallet::from_file(&path, connection.clone())?)
    } else {
        // read-only commands never sign
        debug!("No wallet needed for this command, using an ephemeral key");
        Arc::new(KeypairWallet::new(Keypair::new(), connection.clone()))
    };

    let swap_api: Arc<dyn SwapApi> = Arc::new(JupiterSwapClient::new(
        app_cfg.quote_api_url.clone(),
        app_cfg.token_list_url.clone(),
        app_cfg.slippage_bps,
    ));
    let nft: Arc<dyn NftSdk> = Arc::new(CandyMachineClient::new(connection.clone()));

    let executor = CommandExecutor::new(wallet.clone(), connection, swap_api, nft);
    let result = executor.execute(command).await;

    if wallet.is_connected() {
        wallet.disconnect().await?;
    }
    result
}
