use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use approval_relay::config::{self, Config, LogFormat};
use approval_relay::models::message::EngineMessage;
use approval_relay::{api, cli, engine, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Config decides the log format, so tracing comes up right after it.
    let cfg = config::load();
    init_tracing(
        cfg.as_ref()
            .map(|c| c.log_format)
            .unwrap_or(LogFormat::Text),
    );
    let cfg = checked_config(cfg)?;

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Check { correlation_key }) => {
            run_check(&cfg, &correlation_key).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        tracing::error!("{:#}", e);
    }
    result
}

/// Config errors surface before any command runs, so log them here.
fn checked_config(cfg: anyhow::Result<Config>) -> anyhow::Result<Config> {
    cfg.inspect_err(|e| tracing::error!("invalid configuration: {:#}", e))
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "approval_relay=debug,tower_http=debug".into()),
    );

    let (text, json) = match format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(text)
        .with(json)
        .init();
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    tracing::info!(
        transport = %cfg.transport(),
        approved_token = %cfg.approved_token,
        "Initializing engine transport..."
    );
    let transport = engine::build_transport(&cfg.engine)?;
    let state = Arc::new(AppState::new(transport, &cfg));

    let app = api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Approval relay listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Approval relay stopped");
    Ok(())
}

/// Send one probe message through the configured transport.
async fn run_check(cfg: &Config, correlation_key: &str) -> anyhow::Result<()> {
    let transport = engine::build_transport(&cfg.engine)?;
    println!("Transport:       {}", transport.kind());
    println!("Correlation key: {}", correlation_key);

    transport
        .deliver(&EngineMessage::probe(correlation_key))
        .await
        .context("probe message was not accepted")?;

    println!("Probe message delivered successfully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
