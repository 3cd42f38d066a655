//! researchdir - researcher directory service entry point
//!
//! Resolves configuration, prepares the database and upload directory, and
//! serves the HTTP API.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};

use researchdir::{build_router, config, db, AppState};

/// Command-line arguments for researchdir
#[derive(Parser, Debug)]
#[command(name = "researchdir")]
#[command(about = "Researcher directory microservice")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(long, env = "RESEARCHDIR_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on
    #[arg(long, env = "RESEARCHDIR_BIND")]
    bind: Option<String>,

    /// SQLite database path
    #[arg(long, env = "RESEARCHDIR_DATABASE")]
    database: Option<PathBuf>,

    /// Directory for uploaded photos
    #[arg(long, env = "RESEARCHDIR_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Researcher Directory (researchdir) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = config::resolve(config::Overrides {
        config: args.config,
        bind: args.bind,
        database: args.database,
        upload_dir: args.upload_dir,
    })?;

    if !config.login_enabled() {
        warn!(
            "Admin credentials not configured ({} / {}); login is disabled",
            config::ENV_ADMIN_USER,
            config::ENV_ADMIN_PASSWORD_SHA256
        );
    }

    std::fs::create_dir_all(&config.upload_dir).with_context(|| {
        format!(
            "Failed to create upload directory {}",
            config.upload_dir.display()
        )
    })?;
    info!("Upload directory: {}", config.upload_dir.display());

    let pool = db::connect(&config.database)
        .await
        .context("Failed to open database")?;
    db::init_schema(&pool).await?;
    info!("✓ Database ready: {}", config.database.display());

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("researchdir listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("Shutdown signal received");
}
