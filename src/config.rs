use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, path::Path};

use passkey_dapp::infrastructure::swap_client::{
    DEFAULT_QUOTE_API_URL, DEFAULT_SLIPPAGE_BPS, DEFAULT_TOKEN_LIST_URL,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkCfg {
    /// devnet | testnet | mainnet-beta | http(s) URL
    pub cluster: String,
    /// Overrides the cluster URL when set
    pub rpc_url: Option<String>,
    pub commitment: String,
}

impl Default for NetworkCfg {
    fn default() -> Self {
        Self {
            cluster: "devnet".to_string(),
            rpc_url: None,
            commitment: "confirmed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WalletCfg {
    pub keypair: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SwapCfg {
    pub quote_api_url: String,
    pub token_list_url: String,
    pub slippage_bps: u16,
}

impl Default for SwapCfg {
    fn default() -> Self {
        Self {
            quote_api_url: DEFAULT_QUOTE_API_URL.to_string(),
            token_list_url: DEFAULT_TOKEN_LIST_URL.to_string(),
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub network: NetworkCfg,
    pub wallet: WalletCfg,
    pub swap: SwapCfg,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let s = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read config {}", path.as_ref().display()))?;
        let cfg: Self = toml::from_str(&s).context("parse Config.toml")?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[network]
cluster = "mainnet-beta"

[swap]
slippage_bps = 100
"#
        )
        .unwrap();

        let cfg = Config::from_file(file.path()).unwrap();
        assert_eq!(cfg.network.cluster, "mainnet-beta");
        assert_eq!(cfg.network.commitment, "confirmed");
        assert_eq!(cfg.swap.slippage_bps, 100);
        assert_eq!(cfg.swap.quote_api_url, DEFAULT_QUOTE_API_URL);
        assert!(cfg.wallet.keypair.is_none());
    }

    #[test]
    fn test_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[network]
cluster = "devnet"
rpc_url = "http://127.0.0.1:8899"
commitment = "finalized"

[wallet]
keypair = "~/.config/solana/id.json"

[swap]
quote_api_url = "http://localhost:8080/v6"
token_list_url = "http://localhost:8080/tokens"
slippage_bps = 25
"#
        )
        .unwrap();

        let cfg = Config::from_file(file.path()).unwrap();
        assert_eq!(cfg.network.rpc_url.as_deref(), Some("http://127.0.0.1:8899"));
        assert_eq!(cfg.wallet.keypair.as_deref(), Some("~/.config/solana/id.json"));
        assert_eq!(cfg.swap.token_list_url, "http://localhost:8080/tokens");
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[network\ncluster = ").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("parse Config.toml"));
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_file("/nonexistent/passkey-dapp.toml").is_err());
    }
}
