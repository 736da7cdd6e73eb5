use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use real_estate_listings::api::{create_router, create_router_with_rate_limit};
use real_estate_listings::app::AppState;
use real_estate_listings::config::AppConfig;
use real_estate_listings::infra::{PostgresClient, init_metrics_handle, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    init_tracing(config.log_format).context("failed to initialize tracing")?;

    let metrics_handle = if config.metrics_enabled {
        let handle = init_metrics_handle();
        if handle.is_none() {
            warn!("Metrics recorder could not be installed, /metrics will return 404");
        }
        handle
    } else {
        None
    };

    let db = PostgresClient::new(config.database_url.expose_secret(), config.database.clone())
        .await
        .context("failed to connect to database")?
        .with_retry_policy(config.retry.clone());

    if config.run_migrations {
        db.run_migrations()
            .await
            .context("failed to run database migrations")?;
    }

    let db = Arc::new(db);
    let app_state = Arc::new(AppState::new(db.clone(), db).with_metrics(metrics_handle));

    let router = if config.rate_limit_enabled {
        info!(
            rps = config.rate_limit.general_rps,
            burst = config.rate_limit.general_burst,
            "Rate limiting enabled"
        );
        create_router_with_rate_limit(app_state, config.rate_limit.clone())
    } else {
        create_router(app_state)
    };

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "Listing service started");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Listing service stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
