//! lfsgate server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use lfsgate_core::config::AppConfig;
use lfsgate_server::{AppState, create_router};
use std::net::SocketAddr;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const ENV_PREFIX: &str = "LFSGATE_";
const CONFIG_PATH_ENV: &str = "LFSGATE_CONFIG";

/// lfsgate - Git LFS batch API server backed by S3-compatible storage
#[derive(Parser, Debug)]
#[command(name = "lfsgated")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "LFSGATE_CONFIG",
        default_value = "config/server.toml"
    )]
    config: String,
}

/// Load configuration from an optional TOML file overlaid with `LFSGATE_*`
/// environment variables (nested keys split on `__`).
fn load_config(path: &str) -> Result<AppConfig> {
    let mut figment = Figment::new();
    let has_config_file = Path::new(path).exists();

    if has_config_file {
        tracing::info!(config_path = %path, "Loading configuration from file");
        figment = figment.merge(Toml::file(path));
    } else {
        tracing::debug!("No config file found at {}", path);
    }

    let has_env_config = std::env::vars()
        .any(|(key, _)| key.starts_with(ENV_PREFIX) && key != CONFIG_PATH_ENV);

    if !has_config_file && !has_env_config {
        anyhow::bail!(
            "No configuration provided.\n\n\
             Provide configuration via one of:\n  \
             1. Config file: lfsgated --config /path/to/config.toml\n  \
             2. Environment variables: LFSGATE_STORAGE__TYPE=s3 \
             LFSGATE_STORAGE__BUCKET=lfs-objects LFSGATE_AUTH__ALLOWED_ORGS='[\"my-org\"]' lfsgated\n\n\
             See config/server.example.toml for example configuration.\n\
             Set LFSGATE_CONFIG env var to specify a default config file path."
        );
    }

    if !has_config_file {
        tracing::info!("Using environment variables for configuration");
    }

    figment
        .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]).split("__"))
        .extract()
        .context("failed to load configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("lfsgate v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;

    if config.server.metrics_enabled {
        lfsgate_server::metrics::register_metrics();
        tracing::info!("Prometheus metrics registered");
    }

    let storage = lfsgate_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;
    tracing::info!(backend = storage.backend_name(), "Storage backend initialized");

    // Fail before accepting requests if the bucket is unreachable
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!("Storage backend connectivity verified");

    let identity = lfsgate_identity::from_config(&config.auth.identity)
        .context("failed to initialize identity provider")?;
    tracing::info!(
        provider = identity.provider_name(),
        allowed_orgs = config.auth.allowed_orgs.len(),
        "Identity provider initialized"
    );

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    let state = AppState::new(config, storage, identity);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
