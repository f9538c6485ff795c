use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use interio_server::config::{load_env_file, Settings};
use interio_server::{app_from_settings, logging, API_VERSION};
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "interio-server", version, about = "Interior design image generation API")]
struct Cli {
    /// Bind address; overrides HOST.
    #[arg(long)]
    host: Option<String>,
    /// Bind port; overrides PORT.
    #[arg(long)]
    port: Option<u16>,
    /// Env file to load before reading configuration (default: ./.env if present).
    #[arg(long)]
    env_file: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: String,
    #[arg(long)]
    json_logs: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("interio-server error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let env_file = load_env_file(cli.env_file.as_deref())?;
    logging::init(&cli.log_level, cli.json_logs)?;
    if let Some(path) = env_file {
        tracing::info!(path = %path.display(), "loaded environment file");
    }

    let mut settings = Settings::from_env().context("invalid configuration")?;
    if let Some(host) = cli.host {
        settings.host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(serve(settings))
}

async fn serve(settings: Settings) -> Result<()> {
    let app = app_from_settings(&settings);
    let addr = settings.bind_addr();
    let listener = TcpListener::bind(addr.as_str())
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(
        %addr,
        version = API_VERSION,
        openai_configured = settings.openai_api_key.is_some(),
        gemini_configured = settings.google_api_key.is_some(),
        cors_origins = ?settings.cors_origins,
        max_body_bytes = settings.max_body_bytes,
        "interio-server listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;
    tracing::info!("interio-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received, draining connections");
}
