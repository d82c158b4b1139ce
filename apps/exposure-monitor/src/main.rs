//! Exposure Monitor Binary
//!
//! Starts the refresh loop and the HTTP surface.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin exposure-monitor
//! ```
//!
//! # Environment Variables
//!
//! ## Required
//! - `CENTROID_LOGIN_URL`: Bridge login endpoint
//! - `CENTROID_POSITIONS_URL`: Bridge positions endpoint
//! - `CENTROID_USERNAME`, `CENTROID_PASSWORD`: Bridge credentials
//!
//! ## Optional
//! - `CENTROID_CLIENT_CODE`: Client code when login returns none
//! - `CENTROID_ACCOUNTS`: Comma-separated account identifiers (default: all)
//! - `CENTROID_LOGIN_TIMEOUT_SECS`: Login timeout (default: 15)
//! - `CENTROID_FETCH_TIMEOUT_SECS`: Positions timeout (default: 25)
//! - `EXPOSURE_REFRESH_INTERVAL_SECS`: Refresh period (default: 5)
//! - `EXPOSURE_HTTP_PORT`: HTTP port, 0 disables (default: 8083)
//! - `EXPOSURE_FILTER_SYMBOL`, `EXPOSURE_FILTER_TAKER`: View filters
//! - `EXPOSURE_RUN_ONCE`: Run one cycle, print the view as JSON, exit
//! - `OTEL_ENABLED`: Export spans over OTLP (default: false)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use exposure_monitor::application::services::{
    CycleContext, CycleOutcome, MonitorStatus, Pipeline, PositionFetcher, RefreshScheduler,
};
use exposure_monitor::infrastructure::broker::{HttpPositionsClient, HttpSessionAuthenticator};
use exposure_monitor::infrastructure::health::{HealthServer, HealthServerState};
use exposure_monitor::infrastructure::telemetry;
use exposure_monitor::{InstrumentCatalog, MonitorConfig, init_metrics};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Exposure Monitor");

    let _metrics_handle = init_metrics();

    let config = MonitorConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let session = HttpSessionAuthenticator::new(&config.bridge, config.credentials.clone())?;
    let positions = HttpPositionsClient::new(&config.bridge)?;
    let pipeline = Pipeline::new(
        PositionFetcher::new(Arc::new(session), Arc::new(positions)),
        Arc::new(InstrumentCatalog::default()),
    );

    let status = Arc::new(MonitorStatus::new());
    let context = CycleContext {
        accounts: config.accounts.clone(),
        filter: config.filter.clone(),
    };
    let mut scheduler = RefreshScheduler::new(
        pipeline,
        context,
        config.refresh.interval,
        Arc::clone(&status),
    );

    if config.refresh.run_once {
        let outcome = scheduler.run_once().await?;
        match outcome {
            CycleOutcome::Published(model) => {
                println!("{}", serde_json::to_string_pretty(&model)?);
            }
            CycleOutcome::NoData { reason, .. } => {
                tracing::warn!(reason = reason.as_str(), "No exposure to show");
            }
        }
        return Ok(());
    }

    if config.server.http_port != 0 {
        let health_state = Arc::new(HealthServerState::new(
            env!("CARGO_PKG_VERSION").to_string(),
            Arc::clone(&status),
        ));
        let health_server = HealthServer::new(
            config.server.http_port,
            health_state,
            shutdown_token.clone(),
        );
        tokio::spawn(async move {
            if let Err(e) = health_server.run().await {
                tracing::error!(error = %e, "HTTP server error");
            }
        });
    }

    let mut refresh = tokio::spawn(scheduler.run(shutdown_token.clone()));

    tracing::info!("Exposure monitor ready");

    let result = tokio::select! {
        () = await_shutdown() => {
            shutdown_token.cancel();
            refresh.await
        }
        joined = &mut refresh => {
            shutdown_token.cancel();
            joined
        }
    };

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Refresh loop stopped");
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!("Exposure monitor stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &MonitorConfig) {
    tracing::info!(
        accounts = config.accounts.len(),
        interval_secs = config.refresh.interval.as_secs(),
        http_port = config.server.http_port,
        run_once = config.refresh.run_once,
        client_code_default = config.bridge.default_client_code.is_some(),
        "Configuration loaded"
    );
    tracing::debug!(
        login_url = %config.bridge.login_url,
        positions_url = %config.bridge.positions_url,
        username = config.credentials.username(),
        "Bridge endpoints"
    );
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
