//! agegate daemon — entry point for running the verification gateway.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use agegate_rpc::{AppState, GatewayConfig};

#[derive(Parser)]
#[command(name = "agegate-daemon", about = "Identity verification gateway daemon")]
struct Cli {
    /// Port the HTTP server listens on.
    #[arg(long, env = "AGEGATE_LISTEN_PORT")]
    listen_port: Option<u16>,

    /// OAuth client id issued by the identity provider.
    #[arg(long, env = "AGEGATE_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth client secret issued by the identity provider.
    #[arg(long, env = "AGEGATE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// URL the identity provider redirects the popup back to.
    #[arg(long, env = "AGEGATE_RETURN_URL")]
    return_url: Option<String>,

    /// Origins allowed to receive relayed outcomes (comma-separated).
    #[arg(long, env = "AGEGATE_ALLOWED_ORIGINS", value_delimiter = ',')]
    allowed_origins: Vec<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "AGEGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "AGEGATE_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,
}

/// An explicitly given config file must load; a gateway falling back to
/// default (empty) IdP credentials would fail every upstream call.
fn load_config(path: &Path) -> anyhow::Result<GatewayConfig> {
    GatewayConfig::from_toml_file(&path.display().to_string())
        .with_context(|| format!("failed to load config file {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref config_path) => load_config(config_path)?,
        None => GatewayConfig::default(),
    };
    if let Some(port) = cli.listen_port {
        config.listen_port = port;
    }
    if let Some(client_id) = cli.client_id {
        config.client_id = client_id;
    }
    if let Some(client_secret) = cli.client_secret {
        config.client_secret = client_secret;
    }
    if let Some(return_url) = cli.return_url {
        config.return_url = return_url;
    }
    if !cli.allowed_origins.is_empty() {
        config.allowed_origins = cli.allowed_origins;
    }
    if let Some(log_level) = cli.log_level {
        config.log_level = log_level;
    }
    if let Some(log_format) = cli.log_format {
        config.log_format = log_format;
    }

    agegate_utils::init_tracing(&config.log_level, &config.log_format);
    if let Some(ref config_path) = cli.config {
        tracing::info!("Loaded config from {}", config_path.display());
    }

    tracing::info!(
        "Starting verification gateway on port {} ({} allowed origin(s))",
        config.listen_port,
        config.allowed_origins.len(),
    );

    let state = Arc::new(AppState::from_config(&config)?);
    agegate_rpc::serve(&config, state).await?;

    tracing::info!("agegate daemon exited cleanly");
    Ok(())
}
