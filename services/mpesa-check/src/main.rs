//! M-Pesa credential check
//!
//! One-shot binary that:
//! 1. Loads client configuration (TOML) and consumer credentials
//! 2. Requests an access token to prove the credentials work
//! 3. Optionally submits an account balance query
//! 4. Optionally prints the client's Prometheus counters

mod cli;
mod metrics;

use anyhow::{Context, Result};
use mpesa_sdk::{ConsumerCredentials, Mpesa, MpesaConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Args, balance_request};

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs, filter from LOG_LEVEL / RUST_LOG
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting mpesa-check");

    let args = Args::parse(std::env::args())?;
    let prometheus = if args.metrics {
        Some(metrics::install_recorder()?)
    } else {
        None
    };

    let config = load_config(args.config.as_deref())?;
    info!(
        environment = ?config.environment,
        token_url = %config.token_url(),
        max_retries = config.max_retries,
        "configuration loaded"
    );

    let credentials = ConsumerCredentials::resolve(&config.credentials)
        .context("failed to resolve consumer credentials")?;
    let mpesa = Mpesa::new(credentials, config).context("failed to build M-Pesa client")?;

    mpesa
        .test_auth()
        .await
        .context("token request failed")?;
    info!("consumer credentials accepted");

    if args.balance {
        let request = balance_request(|name| std::env::var(name).ok())?;
        let response = mpesa
            .check_account_balance(&request)
            .await
            .context("account balance query failed")?;
        info!(
            accepted = response.is_accepted(),
            conversation_id = response.conversation_id.as_deref().unwrap_or(""),
            description = response.response_description.as_deref().unwrap_or(""),
            "account balance query submitted"
        );
    }

    if let Some(handle) = prometheus {
        println!("{}", handle.render());
    }

    Ok(())
}

/// Explicit paths must exist; a missing default file falls back to sandbox
/// defaults.
fn load_config(cli_path: Option<&str>) -> Result<MpesaConfig> {
    let explicit = cli_path.is_some() || std::env::var_os("MPESA_CONFIG").is_some();
    let path = MpesaConfig::resolve_path(cli_path);

    if !explicit && !path.exists() {
        warn!(path = %path.display(), "no configuration file, using sandbox defaults");
        return Ok(MpesaConfig::default());
    }

    info!(path = %path.display(), "loading configuration");
    MpesaConfig::load(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))
}
