//! CLI commands and handlers
use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use crate::application::controllers::{
    ActionState, DashboardController, PasskeyAuthController, SwapController, TransactionController,
    TransactionOutcome,
};
use crate::domain::wallet::WalletConnection;
use crate::infrastructure::connection::LedgerConnection;
use crate::infrastructure::nft::NftSdk;
use crate::infrastructure::swap_client::SwapApi;
use crate::shared::types::{TokenDescriptor, TransactionKind};

#[derive(Parser, Debug)]
#[command(name = "passkey-dapp")]
#[command(version, about = "Passkey wallet dApp for Solana: transfers, NFT mints and token swaps")]
pub struct Cli {
    /// Path to config file (optional)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// RPC endpoint URL (overrides cluster)
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// devnet, testnet, mainnet-beta or an RPC URL
    #[arg(long, global = true)]
    pub cluster: Option<String>,

    /// Path to keypair file
    #[arg(long, global = true)]
    pub keypair: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Connect and show the SOL balance
    Balance,

    /// Sign a message and print the hex signature
    SignMessage {
        #[arg(default_value = crate::application::controllers::transactions::GREETING_MESSAGE)]
        message: String,
    },

    /// Sign and send a 100 lamport self-transfer
    TestTx,

    /// Transfer SOL
    TransferSol {
        recipient: String,
        #[arg(default_value = crate::application::controllers::transactions::DEFAULT_AMOUNT)]
        amount: String,
    },

    /// Transfer SPL tokens, creating the recipient token account if needed
    TransferToken {
        recipient: String,
        mint: String,
        amount: String,
    },

    /// Mint an NFT from a candy machine
    MintNft { candy_machine: String },

    /// List swappable tokens
    Tokens {
        /// Filter by symbol or name
        #[arg(short, long)]
        search: Option<String>,

        /// Limit number of tokens to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Quote a swap (tokens by symbol or mint)
    Quote {
        #[arg(long, default_value = "SOL")]
        from: String,
        #[arg(long, default_value = "USDC")]
        to: String,
        amount: String,
    },

    /// Quote and execute a swap
    Swap {
        #[arg(long, default_value = "SOL")]
        from: String,
        #[arg(long, default_value = "USDC")]
        to: String,
        amount: String,
    },
}

impl Commands {
    /// Whether the command acts on behalf of the wallet.
    pub fn requires_wallet(&self) -> bool {
        !matches!(self, Commands::Tokens { .. } | Commands::Quote { .. })
    }
}

/// Outcome of a finished controller action, or its error text.
fn outcome<T>(state: &ActionState<T>) -> Result<&T> {
    match state {
        ActionState::Success(value) => Ok(value),
        ActionState::Error(msg) => Err(anyhow!(msg.clone())),
        ActionState::Idle | ActionState::Loading => bail!("Action did not complete"),
    }
}

pub struct CommandExecutor {
    wallet: Arc<dyn WalletConnection>,
    connection: Arc<dyn LedgerConnection>,
    swap_api: Arc<dyn SwapApi>,
    nft: Arc<dyn NftSdk>,
}

impl CommandExecutor {
    pub fn new(
        wallet: Arc<dyn WalletConnection>,
        connection: Arc<dyn LedgerConnection>,
        swap_api: Arc<dyn SwapApi>,
        nft: Arc<dyn NftSdk>,
    ) -> Self {
        Self {
            wallet,
            connection,
            swap_api,
            nft,
        }
    }

    /// Execute the selected command
    pub async fn execute(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Balance => self.execute_balance_command().await,
            Commands::SignMessage { message } => self.execute_sign_message_command(&message).await,
            Commands::TestTx => self.execute_test_tx_command().await,
            Commands::TransferSol { recipient, amount } => {
                self.execute_transaction_command(TransactionKind::Sol, |form| {
                    form.recipient = recipient;
                    form.amount = amount;
                })
                .await
            }
            Commands::TransferToken { recipient, mint, amount } => {
                self.execute_transaction_command(TransactionKind::Token, |form| {
                    form.recipient = recipient;
                    form.token_mint = mint;
                    form.amount = amount;
                })
                .await
            }
            Commands::MintNft { candy_machine } => {
                self.execute_transaction_command(TransactionKind::Nft, |form| {
                    form.candy_machine_id = candy_machine;
                })
                .await
            }
            Commands::Tokens { search, limit } => self.execute_tokens_command(search, limit).await,
            Commands::Quote { from, to, amount } => self.execute_swap_command(&from, &to, amount, false).await,
            Commands::Swap { from, to, amount } => self.execute_swap_command(&from, &to, amount, true).await,
        }
    }

    async fn connect(&self) -> Result<()> {
        let owner = self.wallet.connect().await?;
        println!("Connected: {}", owner);
        Ok(())
    }

    async fn execute_balance_command(&self) -> Result<()> {
        let mut dashboard = DashboardController::new(self.wallet.clone(), self.connection.clone());
        let owner = dashboard.connect().await?;
        println!("Connected: {}", owner);

        outcome(dashboard.state())?;
        println!("Wallet Balance: {}", dashboard.balance_display());
        Ok(())
    }

    async fn execute_sign_message_command(&self, message: &str) -> Result<()> {
        self.connect().await?;
        let mut auth = PasskeyAuthController::new(self.wallet.clone(), self.connection.clone());

        auth.sign_message(message).await;
        println!("Signature: {}", outcome(auth.message_state())?);
        Ok(())
    }

    async fn execute_test_tx_command(&self) -> Result<()> {
        self.connect().await?;
        let mut auth = PasskeyAuthController::new(self.wallet.clone(), self.connection.clone());

        auth.sign_test_transaction().await;
        println!("Transaction Signature: {}", outcome(auth.transaction_state())?);
        Ok(())
    }

    async fn execute_transaction_command<F>(&self, kind: TransactionKind, fill: F) -> Result<()>
    where
        F: FnOnce(&mut crate::application::controllers::TransactionForm),
    {
        self.connect().await?;
        let mut screen =
            TransactionController::new(self.wallet.clone(), self.connection.clone(), self.nft.clone());
        screen.form.kind = kind;
        fill(&mut screen.form);

        info!("Executing {}", kind.as_str());
        screen.execute().await;

        match outcome(screen.state())? {
            TransactionOutcome::Minted { mint, signatures } => {
                println!("Minted NFT: {}", mint);
                for signature in signatures {
                    println!("Transaction Signature: {}", signature);
                }
            }
            TransactionOutcome::Signature(signature) => println!("Transaction Signature: {}", signature),
        }
        Ok(())
    }

    async fn execute_tokens_command(&self, search: Option<String>, limit: usize) -> Result<()> {
        let mut swap = SwapController::new(self.wallet.clone(), self.connection.clone(), self.swap_api.clone());
        let total = swap.load_tokens().await?;

        let needle = search.map(|s| s.to_lowercase());
        let matches: Vec<&TokenDescriptor> = swap
            .tokens()
            .iter()
            .filter(|t| match &needle {
                Some(n) => t.symbol.to_lowercase().contains(n) || t.name.to_lowercase().contains(n),
                None => true,
            })
            .take(limit)
            .collect();

        println!("Showing {} of {} tokens", matches.len(), total);
        for token in matches {
            println!("  {:<40} {} ({} decimals)", token.address, token.label(), token.decimals);
        }
        Ok(())
    }

    async fn execute_swap_command(&self, from: &str, to: &str, amount: String, execute: bool) -> Result<()> {
        if execute {
            self.connect().await?;
        }

        let mut swap = SwapController::new(self.wallet.clone(), self.connection.clone(), self.swap_api.clone());
        swap.load_tokens().await?;
        swap.from_token = Some(swap.find_token(from).ok_or_else(|| anyhow!("Unknown token: {}", from))?);
        swap.to_token = Some(swap.find_token(to).ok_or_else(|| anyhow!("Unknown token: {}", to))?);
        swap.amount = amount;

        swap.get_quote().await;
        let summary = outcome(swap.quote_state())?;
        println!("Input: {}", summary.input);
        println!("Output: {}", summary.output);
        println!("Price Impact: {}", summary.price_impact);

        if execute {
            swap.swap().await;
            outcome(swap.swap_state())?;
            if let Some(message) = swap.success_message() {
                println!("{}", message);
            }
        }
        Ok(())
    }
}
