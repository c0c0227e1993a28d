//! Dashboard: connection status and SOL balance

use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tracing::{info, warn};

use super::state::ActionState;
use crate::domain::wallet::WalletConnection;
use crate::infrastructure::connection::LedgerConnection;
use crate::shared::errors::{DappError, DappResult};
use crate::shared::utils::{format_sol, lamports_to_sol};

pub struct DashboardController {
    wallet: Arc<dyn WalletConnection>,
    connection: Arc<dyn LedgerConnection>,
    balance: Option<f64>,
    state: ActionState<f64>,
}

impl DashboardController {
    pub fn new(wallet: Arc<dyn WalletConnection>, connection: Arc<dyn LedgerConnection>) -> Self {
        Self {
            wallet,
            connection,
            balance: None,
            state: ActionState::Idle,
        }
    }

    /// Connect the wallet and refresh the balance once.
    pub async fn connect(&mut self) -> DappResult<Pubkey> {
        let owner = self.wallet.connect().await?;
        info!("Dashboard connected as {}", owner);
        self.refresh_balance().await;
        Ok(owner)
    }

    pub async fn disconnect(&mut self) -> DappResult<()> {
        self.wallet.disconnect().await?;
        self.balance = None;
        self.state.reset();
        Ok(())
    }

    /// Fetch the balance; failures land in the controller state.
    pub async fn refresh_balance(&mut self) {
        self.state.begin();
        match self.fetch_balance().await {
            Ok(sol) => {
                self.balance = Some(sol);
                self.state.succeed(sol);
            }
            Err(e) => {
                warn!("Balance refresh failed: {}", e);
                self.state.fail("Failed to fetch balance", e);
            }
        }
    }

    async fn fetch_balance(&self) -> DappResult<f64> {
        let owner = self.wallet.public_key().ok_or(DappError::WalletNotConnected)?;
        let lamports = self.connection.get_balance(&owner).await?;
        Ok(lamports_to_sol(lamports))
    }

    pub fn is_connected(&self) -> bool {
        self.wallet.is_connected()
    }

    pub fn public_key(&self) -> Option<Pubkey> {
        self.wallet.public_key()
    }

    pub fn balance(&self) -> Option<f64> {
        self.balance
    }

    /// Balance with four decimals, "0 SOL" before the first fetch.
    pub fn balance_display(&self) -> String {
        match self.balance {
            Some(sol) => format_sol(sol),
            None => "0 SOL".to_string(),
        }
    }

    pub fn state(&self) -> &ActionState<f64> {
        &self.state
    }
}
