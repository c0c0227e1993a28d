//! Jupiter quote-and-swap API client

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solana_sdk::{pubkey::Pubkey, transaction::Transaction};
use tracing::{debug, info, warn};

use crate::shared::errors::{DappError, DappResult};
use crate::shared::types::TokenDescriptor;
use crate::shared::utils::from_base_units;

pub const DEFAULT_QUOTE_API_URL: &str = "https://quote-api.jup.ag/v6";
pub const DEFAULT_TOKEN_LIST_URL: &str = "https://token.jup.ag/strict";
pub const DEFAULT_SLIPPAGE_BPS: u16 = 50;

/// Quote returned by the aggregator. Fields not modelled here are kept in
/// `extra` so the quote can be posted back to the swap endpoint unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub input_mint: String,
    pub in_amount: String,
    pub output_mint: String,
    pub out_amount: String,
    #[serde(default)]
    pub other_amount_threshold: String,
    #[serde(default)]
    pub swap_mode: String,
    #[serde(default)]
    pub slippage_bps: u16,
    #[serde(default)]
    pub price_impact_pct: Value,
    #[serde(default)]
    pub route_plan: Vec<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Quote {
    pub fn in_amount(&self) -> DappResult<u64> {
        parse_amount("inAmount", &self.in_amount)
    }

    pub fn out_amount(&self) -> DappResult<u64> {
        parse_amount("outAmount", &self.out_amount)
    }

    /// Price impact as a fraction (0.01 = 1%).
    pub fn price_impact(&self) -> f64 {
        match &self.price_impact_pct {
            Value::String(s) => s.parse().unwrap_or(0.0),
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }
    }
}

fn parse_amount(field: &str, value: &str) -> DappResult<u64> {
    value
        .parse()
        .map_err(|_| DappError::QuoteUnavailable(format!("Malformed {} in quote: {:?}", field, value)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SwapResponse {
    swap_transaction: String,
    #[serde(default)]
    last_valid_block_height: Option<u64>,
}

/// Human-readable quote details.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteSummary {
    pub input: String,
    pub output: String,
    pub price_impact: String,
}

impl QuoteSummary {
    pub fn new(quote: &Quote, from: &TokenDescriptor, to: &TokenDescriptor) -> DappResult<Self> {
        let in_amount = from_base_units(quote.in_amount()?, from.decimals);
        let out_amount = from_base_units(quote.out_amount()?, to.decimals);

        Ok(Self {
            input: format!("{} {}", from.symbol, in_amount),
            output: format!("{} {}", to.symbol, out_amount),
            price_impact: format!("{:.2}%", quote.price_impact() * 100.0),
        })
    }
}

/// SOL as input and USDC as output, when the list has them.
pub fn default_pair(tokens: &[TokenDescriptor]) -> (Option<TokenDescriptor>, Option<TokenDescriptor>) {
    let find = |symbol: &str| tokens.iter().find(|t| t.symbol == symbol).cloned();
    (find("SOL"), find("USDC"))
}

/// Decode the base64 blob returned by the swap endpoint.
pub fn decode_swap_transaction(encoded: &str) -> DappResult<Transaction> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| DappError::InputValidation(format!("Swap transaction is not valid base64: {}", e)))?;
    bincode::deserialize(&bytes)
        .map_err(|e| DappError::InputValidation(format!("Failed to deserialize swap transaction: {}", e)))
}

/// Swap aggregator contract
#[async_trait]
pub trait SwapApi: Send + Sync {
    async fn get_token_list(&self) -> DappResult<Vec<TokenDescriptor>>;

    async fn get_quote(&self, input_mint: &str, output_mint: &str, amount: u64) -> DappResult<Quote>;

    /// Base64 serialized unsigned transaction for `quote`, paid by `user`.
    async fn get_swap_transaction(&self, quote: &Quote, user: &Pubkey) -> DappResult<String>;
}

/// Jupiter v6 HTTP client
pub struct JupiterSwapClient {
    http_client: Client,
    quote_api_url: String,
    token_list_url: String,
    slippage_bps: u16,
}

impl JupiterSwapClient {
    pub fn new(quote_api_url: String, token_list_url: String, slippage_bps: u16) -> Self {
        Self {
            http_client: Client::new(),
            quote_api_url: quote_api_url.trim_end_matches('/').to_string(),
            token_list_url,
            slippage_bps,
        }
    }
}

impl Default for JupiterSwapClient {
    fn default() -> Self {
        Self::new(
            DEFAULT_QUOTE_API_URL.to_string(),
            DEFAULT_TOKEN_LIST_URL.to_string(),
            DEFAULT_SLIPPAGE_BPS,
        )
    }
}

#[async_trait]
impl SwapApi for JupiterSwapClient {
    async fn get_token_list(&self) -> DappResult<Vec<TokenDescriptor>> {
        info!("Fetching token list from {}", self.token_list_url);

        let response = self.http_client.get(&self.token_list_url).send().await?;
        if !response.status().is_success() {
            return Err(DappError::NetworkFailure(format!(
                "Token list request failed with status: {}",
                response.status()
            )));
        }

        // registry answers either a bare array or `{ "tokens": [...] }`
        let body: Value = response.json().await?;
        let list = match body {
            Value::Object(mut map) => map.remove("tokens").unwrap_or(Value::Array(Vec::new())),
            other => other,
        };

        let tokens: Vec<TokenDescriptor> = serde_json::from_value(list)
            .map_err(|e| DappError::NetworkFailure(format!("Failed to parse token list: {}", e)))?;
        debug!("Loaded {} tokens", tokens.len());
        Ok(tokens)
    }

    async fn get_quote(&self, input_mint: &str, output_mint: &str, amount: u64) -> DappResult<Quote> {
        let url = format!("{}/quote", self.quote_api_url);
        let amount = amount.to_string();
        let slippage = self.slippage_bps.to_string();

        info!("Requesting quote {} -> {} for {}", input_mint, output_mint, amount);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("inputMint", input_mint),
                ("outputMint", output_mint),
                ("amount", amount.as_str()),
                ("slippageBps", slippage.as_str()),
                ("asLegacyTransaction", "true"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!("Quote request failed with status {}: {}", status, body);
            return Err(DappError::QuoteUnavailable(format!(
                "Quote API returned {}: {}",
                status,
                error_message(&body)
            )));
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| DappError::QuoteUnavailable(format!("Malformed quote response: {}", e)))?;
        if let Some(error) = value.get("error") {
            return Err(DappError::QuoteUnavailable(
                error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string()),
            ));
        }

        serde_json::from_value(value)
            .map_err(|e| DappError::QuoteUnavailable(format!("Malformed quote response: {}", e)))
    }

    async fn get_swap_transaction(&self, quote: &Quote, user: &Pubkey) -> DappResult<String> {
        let url = format!("{}/swap", self.quote_api_url);
        let request_body = json!({
            "quoteResponse": quote,
            "userPublicKey": user.to_string(),
            "wrapAndUnwrapSol": true,
            "asLegacyTransaction": true,
        });

        debug!("Requesting swap transaction for {}", user);

        let response = self.http_client.post(&url).json(&request_body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DappError::NetworkFailure(format!(
                "Swap API returned {}: {}",
                status,
                error_message(&body)
            )));
        }

        let swap: SwapResponse = response.json().await?;
        if let Some(height) = swap.last_valid_block_height {
            debug!("Swap transaction valid until block height {}", height);
        }
        Ok(swap.swap_transaction)
    }
}

/// `error` field of a JSON error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::errors::ErrorKind;
    use mockito::Matcher;
    use solana_sdk::{
        hash::Hash, message::Message, signature::{Keypair, Signer}, system_instruction,
    };

    const SOL: &str = "So11111111111111111111111111111111111111112";
    const USDC: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    fn quote_json() -> Value {
        json!({
            "inputMint": SOL,
            "inAmount": "10000000",
            "outputMint": USDC,
            "outAmount": "1500000",
            "otherAmountThreshold": "1492500",
            "swapMode": "ExactIn",
            "slippageBps": 50,
            "priceImpactPct": "0.0012",
            "routePlan": [{"percent": 100}],
            "contextSlot": 123,
            "timeTaken": 0.01
        })
    }

    fn token(symbol: &str, address: &str, decimals: u8) -> TokenDescriptor {
        TokenDescriptor {
            address: address.to_string(),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            decimals,
            logo_uri: None,
            tags: vec![],
        }
    }

    fn client(server: &mockito::ServerGuard) -> JupiterSwapClient {
        JupiterSwapClient::new(server.url(), format!("{}/tokens", server.url()), 50)
    }

    #[tokio::test]
    async fn test_get_quote_sends_expected_query() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/quote")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("inputMint".into(), SOL.into()),
                Matcher::UrlEncoded("outputMint".into(), USDC.into()),
                Matcher::UrlEncoded("amount".into(), "10000000".into()),
                Matcher::UrlEncoded("slippageBps".into(), "50".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(quote_json().to_string())
            .create_async()
            .await;

        let quote = client(&server).get_quote(SOL, USDC, 10_000_000).await.unwrap();
        assert_eq!(quote.out_amount().unwrap(), 1_500_000);
        assert_eq!(quote.extra.get("contextSlot"), Some(&json!(123)));
        assert!((quote.price_impact() - 0.0012).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_get_quote_no_route_is_quote_unavailable() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/quote")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"Could not find any route","errorCode":"COULD_NOT_FIND_ANY_ROUTE"}"#)
            .create_async()
            .await;

        let err = client(&server).get_quote(SOL, USDC, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QuoteUnavailable);
        assert!(err.to_string().contains("Could not find any route"));
    }

    #[tokio::test]
    async fn test_get_swap_transaction_posts_quote() {
        let mut server = mockito::Server::new_async().await;
        let quote: Quote = serde_json::from_value(quote_json()).unwrap();
        let user = Pubkey::new_unique();

        let _mock = server
            .mock("POST", "/swap")
            .match_body(Matcher::PartialJson(json!({
                "quoteResponse": quote_json(),
                "userPublicKey": user.to_string(),
                "asLegacyTransaction": true,
            })))
            .with_status(200)
            .with_body(r#"{"swapTransaction":"AQID","lastValidBlockHeight":42}"#)
            .create_async()
            .await;

        let blob = client(&server).get_swap_transaction(&quote, &user).await.unwrap();
        assert_eq!(blob, "AQID");
    }

    #[tokio::test]
    async fn test_get_token_list_accepts_wrapped_list() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/tokens")
            .with_status(200)
            .with_body(
                json!({"tokens": [
                    {"address": SOL, "symbol": "SOL", "name": "Wrapped SOL", "decimals": 9},
                    {"address": USDC, "symbol": "USDC", "name": "USD Coin", "decimals": 6}
                ]})
                .to_string(),
            )
            .create_async()
            .await;

        let tokens = client(&server).get_token_list().await.unwrap();
        let (from, to) = default_pair(&tokens);
        assert_eq!(from.unwrap().address, SOL);
        assert_eq!(to.unwrap().decimals, 6);
    }

    #[test]
    fn test_summary_divides_by_output_decimals() {
        let quote: Quote = serde_json::from_value(quote_json()).unwrap();
        let summary = QuoteSummary::new(&quote, &token("SOL", SOL, 9), &token("USDC", USDC, 6)).unwrap();

        assert_eq!(summary.input, "SOL 0.01");
        assert_eq!(summary.output, "USDC 1.5");
        assert_eq!(summary.price_impact, "0.12%");
    }

    #[test]
    fn test_decode_swap_transaction() {
        let payer = Keypair::new();
        let ix = system_instruction::transfer(&payer.pubkey(), &payer.pubkey(), 1);
        let mut message = Message::new(&[ix], Some(&payer.pubkey()));
        message.recent_blockhash = Hash::new_unique();
        let tx = Transaction::new_unsigned(message);

        let encoded = STANDARD.encode(bincode::serialize(&tx).unwrap());
        assert_eq!(decode_swap_transaction(&encoded).unwrap(), tx);
        assert!(decode_swap_transaction("***").is_err());
    }
}
