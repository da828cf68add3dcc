//! Podgate MCP gateway server.

use clap::Parser;
use std::path::Path;
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use podgate::{
    auth::AuthConfig,
    config::{CliOverrides, Config},
    create_app_with_config,
    mcp::McpSessionManager,
    state::AppState,
};

/// Podgate - MCP gateway to the pod and customer REST API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Mount all routes under this path, e.g. /gateway
    #[arg(long)]
    base_path: Option<String>,

    /// Shared API key required in the X-API-Key header
    #[arg(long, env = "PODGATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of the backend REST API
    #[arg(long, env = "PODGATE_BACKEND_URL")]
    backend_url: Option<String>,

    /// Bearer token for the backend REST API
    #[arg(long, env = "PODGATE_BACKEND_TOKEN", hide_env_values = true)]
    backend_token: Option<String>,

    /// Log level or filter directive (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            base_path: args.base_path,
            api_key: args.api_key,
            backend_url: args.backend_url,
            backend_token: args.backend_token,
            log_level: args.log_level,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let overrides = CliOverrides::from(Args::parse());
    let config = Config::from_figment(&overrides)?;

    // Held until exit so buffered file logs are flushed
    let _log_guard = init_logging(&config)?;

    info!("Starting podgate {}...", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded");

    let state = AppState::from_config(&config)?;
    let sessions = state.sessions().clone();

    if let Some(idle_timeout) = config.idle_timeout {
        info!(
            "Closing MCP sessions idle for more than {}s",
            idle_timeout.as_secs()
        );
        sessions.spawn_idle_sweeper(idle_timeout);
    }

    let auth_config = AuthConfig::new(config.api_key.clone(), &config.base_path);
    let app = create_app_with_config(
        state,
        auth_config,
        config.cors_allowed_origins.clone(),
        &config.base_path,
    );

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(
        "Server listening on {} (MCP endpoint: {}/mcp)",
        listener.local_addr()?,
        config.base_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sessions, config.shutdown_timeout))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Set up stdout logging and, if configured, a daily rolling log file.
fn init_logging(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    // Config log level overrides RUST_LOG, which overrides the "info" default
    let filter = match &config.log_level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let stdout_layer = fmt::layer()
        .with_target(false)
        .with_timer(UtcTime::new(Rfc3339))
        .compact();

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let prefix = path
                .file_name()
                .map(|name| name.to_os_string())
                .unwrap_or_else(|| "podgate.log".into());
            std::fs::create_dir_all(dir)?;

            let appender = tracing_appender::rolling::daily(dir, prefix);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_timer(UtcTime::new(Rfc3339));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Some(path) = &config.log_file {
        info!("Logging to file {} (rotated daily)", path.display());
    }
    Ok(guard)
}

/// Wait for Ctrl+C or SIGTERM, then close every MCP session within `timeout`.
async fn shutdown_signal(sessions: McpSessionManager, timeout: Duration) {
    wait_for_signal().await;
    info!("Shutdown signal received, closing MCP sessions...");

    match tokio::time::timeout(timeout, sessions.close_all()).await {
        Ok(closed) => info!("Closed {} MCP sessions", closed),
        Err(_) => error!(
            "Timed out after {}s closing MCP sessions, exiting anyway",
            timeout.as_secs()
        ),
    }
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
