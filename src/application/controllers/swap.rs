//! Swap screen: token selection, quote and signed swap submission

use solana_sdk::signature::Signature;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::state::ActionState;
use crate::domain::wallet::{sign_with_wallet, WalletConnection};
use crate::infrastructure::connection::{serialize_transaction, LedgerConnection};
use crate::infrastructure::swap_client::{decode_swap_transaction, default_pair, Quote, QuoteSummary, SwapApi};
use crate::shared::errors::{DappError, DappResult};
use crate::shared::types::TokenDescriptor;
use crate::shared::utils::to_base_units;

pub struct SwapController {
    wallet: Arc<dyn WalletConnection>,
    connection: Arc<dyn LedgerConnection>,
    swap_api: Arc<dyn SwapApi>,
    tokens: Vec<TokenDescriptor>,
    pub from_token: Option<TokenDescriptor>,
    pub to_token: Option<TokenDescriptor>,
    pub amount: String,
    quote: Option<Quote>,
    quote_state: ActionState<QuoteSummary>,
    swap_state: ActionState<Signature>,
}

impl SwapController {
    pub fn new(
        wallet: Arc<dyn WalletConnection>,
        connection: Arc<dyn LedgerConnection>,
        swap_api: Arc<dyn SwapApi>,
    ) -> Self {
        Self {
            wallet,
            connection,
            swap_api,
            tokens: Vec::new(),
            from_token: None,
            to_token: None,
            amount: String::new(),
            quote: None,
            quote_state: ActionState::Idle,
            swap_state: ActionState::Idle,
        }
    }

    /// Load the token list and preselect SOL -> USDC.
    pub async fn load_tokens(&mut self) -> DappResult<usize> {
        self.tokens = self.swap_api.get_token_list().await?;
        let (from, to) = default_pair(&self.tokens);
        if from.is_some() {
            self.from_token = from;
        }
        if to.is_some() {
            self.to_token = to;
        }
        info!("Loaded {} swap tokens", self.tokens.len());
        Ok(self.tokens.len())
    }

    pub fn tokens(&self) -> &[TokenDescriptor] {
        &self.tokens
    }

    /// Select a token by symbol or mint address.
    pub fn find_token(&self, key: &str) -> Option<TokenDescriptor> {
        self.tokens
            .iter()
            .find(|t| t.address == key || t.symbol.eq_ignore_ascii_case(key))
            .cloned()
    }

    pub async fn get_quote(&mut self) {
        let (from, to, amount) = match self.quote_request() {
            Ok(request) => request,
            Err(_) => {
                self.quote_state
                    .reject("Please select tokens and enter a valid amount");
                return;
            }
        };

        self.quote_state.begin();
        let result = self.swap_api.get_quote(&from.address, &to.address, amount).await;
        match result.and_then(|quote| QuoteSummary::new(&quote, &from, &to).map(|summary| (quote, summary))) {
            Ok((quote, summary)) => {
                debug!("Quote: {} -> {}", summary.input, summary.output);
                self.quote = Some(quote);
                self.quote_state.succeed(summary);
            }
            Err(e) => {
                warn!("Quote failed: {}", e);
                self.quote = None;
                self.quote_state.fail("Failed to get quote", e);
            }
        }
    }

    /// Selected pair and the amount in input base units.
    fn quote_request(&self) -> DappResult<(TokenDescriptor, TokenDescriptor, u64)> {
        let (from, to) = match (&self.from_token, &self.to_token) {
            (Some(from), Some(to)) => (from.clone(), to.clone()),
            _ => return Err(DappError::InputValidation("Select both tokens".to_string())),
        };
        let amount = to_base_units(&self.amount, from.decimals)?;
        Ok((from, to, amount))
    }

    pub async fn swap(&mut self) {
        let quote = match (&self.quote, self.wallet.public_key()) {
            (Some(quote), Some(_)) => quote.clone(),
            _ => {
                self.swap_state.reject("Missing quote or wallet not connected");
                return;
            }
        };

        self.swap_state.begin();
        match self.execute_swap(&quote).await {
            Ok(signature) => {
                info!("Swap successful! Transaction ID: {}", signature);
                self.swap_state.succeed(signature);
            }
            Err(e) => self.swap_state.fail("Swap failed", e),
        }
    }

    async fn execute_swap(&self, quote: &Quote) -> DappResult<Signature> {
        let owner = self.wallet.public_key().ok_or(DappError::WalletNotConnected)?;
        let encoded = self.swap_api.get_swap_transaction(quote, &owner).await?;
        let transaction = decode_swap_transaction(&encoded)?;

        let signed = sign_with_wallet(self.wallet.as_ref(), transaction).await?;
        let wire = serialize_transaction(&signed)?;
        self.connection.send_raw_transaction(&wire).await
    }

    pub fn quote(&self) -> Option<&Quote> {
        self.quote.as_ref()
    }

    pub fn quote_state(&self) -> &ActionState<QuoteSummary> {
        &self.quote_state
    }

    pub fn swap_state(&self) -> &ActionState<Signature> {
        &self.swap_state
    }

    /// Success line shown after a swap.
    pub fn success_message(&self) -> Option<String> {
        self.swap_state
            .value()
            .map(|sig| format!("Swap successful! Transaction ID: {}", sig))
    }

    pub fn is_busy(&self) -> bool {
        self.quote_state.is_busy() || self.swap_state.is_busy()
    }
}
