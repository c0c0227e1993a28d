mod app;
mod config;

use anyhow::Result;
use clap::Parser;
use passkey_dapp::application::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    // Load base configuration from file if provided
    let base_config = match &cli.config {
        Some(config_path) => config::Config::from_file(config_path)?,
        None => config::Config::default(),
    };

    // Priority: CLI args > Config file > Defaults
    let mut app_cfg = app::AppCfg::from_config(base_config)?;
    app_cfg.apply_overrides(cli.rpc_url, cli.cluster.as_deref(), cli.keypair)?;

    app::run(app_cfg, cli.command).await
}
