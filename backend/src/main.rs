//! Mixdesk backend server.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use mixdesk::{
    config::{Config, ConfigOverrides},
    create_app_with_config,
    state::AppState,
};

/// Mixdesk - audio mixer registry backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "MIXDESK_PORT")]
    port: Option<u16>,

    /// Path to a TOML configuration file
    #[arg(short, long, env = "MIXDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, env = "MIXDESK_LOG_LEVEL")]
    log_level: Option<String>,

    /// Also write logs to this file
    #[arg(long, env = "MIXDESK_LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_figment(ConfigOverrides {
        port: args.port,
        config_file: args.config,
        log_file: args.log_file,
        log_level: args.log_level,
    })?;

    // Must outlive the server so buffered file logs get flushed
    let _guard = init_logging(&config)?;

    info!("Starting Mixdesk backend server...");
    run(config)
}

/// Set up the tracing subscriber: stdout always, plus a file when configured.
fn init_logging(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.log_level.as_deref().unwrap_or("info"))
        })
    };

    let stdout_layer = fmt::layer()
        .with_target(false)
        .compact()
        .with_filter(filter());

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            std::fs::create_dir_all(&dir)?;

            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(UtcTime::new(Rfc3339))
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Some(path) = &config.log_file {
        info!("Logging to file: {}", path.display());
    }

    Ok(guard)
}

#[tokio::main]
async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config);
    info!(
        "Configuration loaded ({} inputs registered)",
        state.inputs().len()
    );

    let app = create_app_with_config(state, config.cors_allowed_origins.clone());

    // Bind to all interfaces so the API is reachable from the network
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down gracefully...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("Server shut down");
    Ok(())
}
