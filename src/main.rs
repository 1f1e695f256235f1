use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crew_assign::api;
use crew_assign::config::Config;
use crew_assign::error::AppError;
use crew_assign::geo::routing::{OsrmRouteProvider, RouteProvider};
use crew_assign::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let routing: Option<Arc<dyn RouteProvider>> = match &config.routing_url {
        Some(url) => {
            let provider: Arc<dyn RouteProvider> = Arc::new(
                OsrmRouteProvider::new(url, &config.routing_profile, config.routing_timeout())
                    .map_err(|err| AppError::Internal(format!("routing client: {err}")))?,
            );
            tracing::info!(routing_url = %url, "routing service enabled");
            Some(provider)
        }
        None => {
            tracing::info!("no routing service configured; distances are estimated");
            None
        }
    };

    let state = AppState::new(routing, config.scoring_settings(), config.default_rank_limit);
    let app = api::rest::router(Arc::new(state));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
