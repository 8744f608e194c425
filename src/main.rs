use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticket_codes::cli::{self, Cli, Commands};
use ticket_codes::config::Config;
use ticket_codes::startup::run_startup_checks;
use ticket_codes::AppState;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration, then let flags and env vars override it
    let mut config = Config::load(&cli.config)?;
    cli.apply_overrides(&mut config);

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Some(Commands::CheckConfig) => {
            let report = run_startup_checks(&config, None).await;
            cli::print_check_report(&config, &report);
            if !report.all_critical_passed {
                anyhow::bail!("configuration check failed");
            }
            Ok(())
        }
        Some(Commands::Format {
            ref ticket,
            ref representative,
        }) => {
            let db = ticket_codes::db::init_in_memory().await?;
            let state = AppState::from_config(config, db).await?;
            cli::run_format(&state, ticket, representative).await
        }
        None => serve(config, cli.skip_checks).await,
    }
}

async fn serve(config: Config, skip_checks: bool) -> Result<()> {
    tracing::info!("Starting ticket-codes v{}", env!("CARGO_PKG_VERSION"));

    std::fs::create_dir_all(&config.server.data_dir).with_context(|| {
        format!(
            "Failed to create data directory {}",
            config.server.data_dir.display()
        )
    })?;

    let db = ticket_codes::db::init(&config.server.data_dir).await?;

    let report = run_startup_checks(&config, Some(&db)).await;
    if !report.all_critical_passed {
        if skip_checks {
            tracing::warn!("Critical startup checks failed, continuing because --skip-checks is set");
        } else {
            anyhow::bail!("Startup checks failed: {}", report.summary);
        }
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::from_config(config, db).await?);
    let app = ticket_codes::api::create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    drain_background(&state).await;

    tracing::info!("Server stopped");
    Ok(())
}

/// Give in-flight email sends a bounded window to finish.
async fn drain_background(state: &AppState) {
    state.background.close();
    if state.background.is_empty() {
        return;
    }

    tracing::info!(tasks = state.background.len(), "Waiting for background tasks");
    if tokio::time::timeout(SHUTDOWN_GRACE, state.background.wait())
        .await
        .is_err()
    {
        tracing::warn!(
            tasks = state.background.len(),
            "Background tasks still running after shutdown grace period"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install signal handler");
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

    tracing::info!("Shutdown signal received");
}
