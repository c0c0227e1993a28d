//! Transaction screen: one form, one execute action dispatching on the kind

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use super::state::ActionState;
use crate::domain::transactions::TransactionBuilder;
use crate::domain::wallet::{
    sign_message_with_wallet, ExecuteTransactionAdapter, ExecuteTransactionRequest, WalletConnection,
};
use crate::infrastructure::connection::LedgerConnection;
use crate::infrastructure::nft::NftSdk;
use crate::shared::errors::{DappError, DappResult};
use crate::shared::types::{TransactionKind, SOL_DECIMALS};
use crate::shared::utils::{parse_address, to_base_units, validate_amount};

pub const GREETING_MESSAGE: &str = "Hello Passkeys!";
pub const DEFAULT_AMOUNT: &str = "0.01";

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionForm {
    pub kind: TransactionKind,
    pub recipient: String,
    pub amount: String,
    pub token_mint: String,
    pub candy_machine_id: String,
}

impl Default for TransactionForm {
    fn default() -> Self {
        Self {
            kind: TransactionKind::Test,
            recipient: String::new(),
            amount: DEFAULT_AMOUNT.to_string(),
            token_mint: String::new(),
            candy_machine_id: String::new(),
        }
    }
}

impl TransactionForm {
    /// Fields the selected kind needs, checked before any network call.
    fn validate(&self) -> DappResult<()> {
        let require = |value: &str, field: &str| {
            if value.trim().is_empty() {
                Err(DappError::InputValidation(format!("{} is required", field)))
            } else {
                Ok(())
            }
        };

        match self.kind {
            TransactionKind::Test => Ok(()),
            TransactionKind::Sol => {
                require(&self.recipient, "Recipient")?;
                require(&self.amount, "Amount")
            }
            TransactionKind::Token => {
                require(&self.recipient, "Recipient")?;
                require(&self.amount, "Amount")?;
                require(&self.token_mint, "Token mint")
            }
            TransactionKind::Nft => require(&self.candy_machine_id, "Candy machine ID"),
        }
    }
}

/// What the screen shows after a successful execute.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    Signature(Signature),
    /// Address of the minted asset and the wallet signatures of the mint transaction
    Minted { mint: Pubkey, signatures: Vec<Signature> },
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOutcome::Signature(sig) => write!(f, "{}", sig),
            TransactionOutcome::Minted { mint, .. } => write!(f, "{}", mint),
        }
    }
}

pub struct TransactionController {
    wallet: Arc<dyn WalletConnection>,
    connection: Arc<dyn LedgerConnection>,
    builder: TransactionBuilder,
    nft: Arc<dyn NftSdk>,
    pub form: TransactionForm,
    message_state: ActionState<String>,
    state: ActionState<TransactionOutcome>,
}

impl TransactionController {
    pub fn new(
        wallet: Arc<dyn WalletConnection>,
        connection: Arc<dyn LedgerConnection>,
        nft: Arc<dyn NftSdk>,
    ) -> Self {
        Self {
            builder: TransactionBuilder::new(connection.clone()),
            wallet,
            connection,
            nft,
            form: TransactionForm::default(),
            message_state: ActionState::Idle,
            state: ActionState::Idle,
        }
    }

    /// Sign the fixed greeting; the signature is shown hex-encoded.
    pub async fn sign_greeting(&mut self) {
        if !self.wallet.is_connected() {
            self.message_state.reject("Please connect your wallet first");
            return;
        }

        self.message_state.begin();
        match sign_message_with_wallet(self.wallet.as_ref(), GREETING_MESSAGE.as_bytes()).await {
            Ok(signature) => self.message_state.succeed(hex::encode(signature)),
            Err(e) => self.message_state.fail("Signing failed", e),
        }
    }

    /// Run the action selected by `form.kind`.
    pub async fn execute(&mut self) {
        let kind = self.form.kind;

        if let Err(e) = self.form.validate() {
            self.state.fail(kind.failure_prefix(), e);
            return;
        }

        self.state.begin();
        match self.dispatch(kind).await {
            Ok(outcome) => {
                info!("{} succeeded: {}", kind.as_str(), outcome);
                self.state.succeed(outcome);
            }
            Err(e) => {
                warn!(kind = ?e.kind(), "{} failed: {}", kind.as_str(), e);
                self.state.fail(kind.failure_prefix(), e);
            }
        }
    }

    async fn dispatch(&self, kind: TransactionKind) -> DappResult<TransactionOutcome> {
        let owner = self.wallet.public_key().ok_or(DappError::WalletNotConnected)?;

        match kind {
            TransactionKind::Test => {
                let tx = self.builder.build_self_test_transfer(&owner).await?;
                // test flow passes the bare transaction
                let signature = self.wallet.execute_transaction(ExecuteTransactionRequest::new(tx)).await?;
                Ok(TransactionOutcome::Signature(signature))
            }
            TransactionKind::Sol => {
                let lamports = to_base_units(&self.form.amount, SOL_DECIMALS)?;
                let tx = self
                    .builder
                    .build_native_transfer(&owner, &self.form.recipient, lamports)
                    .await?;
                self.execute_with_placeholders(tx, &owner).await
            }
            TransactionKind::Token => {
                // everything but precision is checked before the decimals lookup
                parse_address(&self.form.recipient)?;
                validate_amount(&self.form.amount)?;
                let decimals = self.builder.mint_decimals(&self.form.token_mint).await?;
                let amount = to_base_units(&self.form.amount, decimals)?;
                let tx = self
                    .builder
                    .build_token_transfer(&owner, &self.form.recipient, &self.form.token_mint, amount)
                    .await?;
                self.execute_with_placeholders(tx, &owner).await
            }
            TransactionKind::Nft => {
                let candy_machine_id = parse_address(&self.form.candy_machine_id)?;
                let adapter =
                    ExecuteTransactionAdapter::new(owner, self.wallet.clone(), self.connection.clone());

                let candy_machine = self.nft.find_by_address(&candy_machine_id).await?;
                let minted = self.nft.mint(&candy_machine, &adapter).await?;

                let mut signatures = adapter.executed_signatures().await;
                signatures.extend(minted.signature);
                Ok(TransactionOutcome::Minted {
                    mint: minted.mint,
                    signatures,
                })
            }
        }
    }

    async fn execute_with_placeholders(
        &self,
        tx: solana_sdk::transaction::Transaction,
        owner: &Pubkey,
    ) -> DappResult<TransactionOutcome> {
        let request = ExecuteTransactionRequest::with_placeholders(tx, owner);
        let signature = self.wallet.execute_transaction(request).await?;
        Ok(TransactionOutcome::Signature(signature))
    }

    pub fn message_state(&self) -> &ActionState<String> {
        &self.message_state
    }

    pub fn state(&self) -> &ActionState<TransactionOutcome> {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy() || self.message_state.is_busy()
    }
}
