mod config;
mod errors;
mod export;
mod handlers;
mod ingest;
mod ml;
mod models;

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppConfig, ServerConfig};
use crate::handlers::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "algograss=info,tower_http=info".into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = AppConfig::load()?;
    tracing::info!("Configuration loaded");

    let state = AppState::new(&config);
    let app = router(state, &config.server);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting AlgoGrass API on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn router(state: AppState, server: &ServerConfig) -> Router {
    with_layers(routes(), server).with_state(state)
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        // RetailIQ forecasting
        .route("/api/forecast", post(handlers::forecasts::forecast))
        .route("/api/forecast/upload", post(handlers::forecasts::upload))
        .route("/api/forecast/export", post(handlers::forecasts::export_csv))
        .route("/api/sales/summary", post(handlers::sales::summary))
        .route("/api/sales/upload", post(handlers::sales::upload))
        // Greenlytics emissions
        .route("/api/emissions", post(handlers::emissions::estimate))
        .route("/api/emissions/upload", post(handlers::emissions::upload))
        .route("/api/emissions/factors", get(handlers::emissions::get_factors))
        .route("/api/emissions/template", get(handlers::emissions::template))
}

fn with_layers<S>(router: Router<S>, server: &ServerConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(DefaultBodyLimit::max(server.max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(server.request_timeout_secs)))
        .layer(middleware::map_response(errors::timeout_response))
        .layer(CatchPanicLayer::custom(errors::panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
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
                tracing::error!("Failed to install SIGTERM handler: {e}");
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
