//! Launchpad Orchestrator - HTTP service entry point
//!
//! Loads configuration and signing keys, connects to the ledger RPC node and
//! serves the launchpad API until interrupted.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use launchpad_orchestrator::api;
use launchpad_orchestrator::config::Config;
use launchpad_orchestrator::ledger::RpcLedger;
use launchpad_orchestrator::wallet::SigningContext;
use launchpad_orchestrator::Launchpad;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "launchpad.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Bind address, overrides `server.bind`
    #[arg(long, env = "LAUNCHPAD_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    info!("🚀 Starting Launchpad Orchestrator");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    info!("📋 Loading configuration from: {}", args.config);
    let config = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;
    let settings = config
        .engine_settings()
        .context("Invalid configuration")?;
    info!("🧩 Program: {}", settings.program.program_id());
    info!("⚙️  Launchpad config: {}", settings.config_address);

    info!("🔑 Loading signing keys");
    let signing = SigningContext::from_files(
        &config.wallet.keypair_path,
        &config.wallet.swap_authority_keypair_path,
    )?;
    info!("💼 Wallet address: {}", signing.wallet_pubkey());
    info!("🔐 Swap authority: {}", signing.swap_authority_pubkey());

    info!("🌐 Connecting to RPC: {}", config.rpc.url);
    let ledger = Arc::new(RpcLedger::new(config.rpc_ledger_config()?));
    let engine = Arc::new(Launchpad::new(ledger, signing, settings));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app: Router = api::router(engine)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let bind = args.bind.unwrap_or(config.server.bind);
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    info!("✅ Listening on http://{}", bind);
    info!("Endpoints:");
    info!("  GET  /health");
    info!("  POST /api/config");
    info!("  POST /api/markets");
    info!("  POST /api/markets/free");
    info!("  GET  /api/markets/:address/lifecycle");
    info!("  POST /api/vesting");
    info!("  POST /api/vesting/release");
    info!("  POST /api/stake");
    info!("  POST /api/swap");
    info!("  POST /api/swap/quote");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("👋 Launchpad Orchestrator stopped");
    Ok(())
}

/// Initialize logging system
fn init_logging(verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        "launchpad_orchestrator=debug,tower_http=debug,info"
    } else {
        "launchpad_orchestrator=info,warn,error"
    };

    let registry = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| env_filter.into()),
    );

    #[cfg(feature = "json-logs")]
    registry
        .with(tracing_subscriber::fmt::layer().json().with_target(true))
        .init();

    #[cfg(not(feature = "json-logs"))]
    registry
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("🛑 Received shutdown signal");
    }
}
