//! Paysync server binary.
//!
//! Wires the reconciliation core to its infrastructure: PostgreSQL record
//! stores, the Stripe checkout gateway, and the axum HTTP surface.
//!
//! ## Endpoints
//!
//! - `POST /api/webhooks/stripe` - provider webhook deliveries
//! - `POST /api/checkout/sessions` - client checkout session creation
//! - `GET /health` - liveness probe

use std::sync::Arc;

use axum::http::HeaderValue;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use paysync::adapters::http::{api_router, AppState};
use paysync::adapters::postgres::{
    PostgresAccountStore, PostgresFailureLog, PostgresSubscriptionStore,
};
use paysync::adapters::stripe::{StripeCheckoutGateway, StripeConfig};
use paysync::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    // RUST_LOG wins over the configured directive when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        port = config.server.port,
        test_mode = config.payment.is_test_mode(),
        "Starting paysync"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(&config.database.url)
        .await?;
    tracing::info!("Database pool created");

    let state = AppState {
        accounts: Arc::new(PostgresAccountStore::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionStore::new(pool.clone())),
        failures: Arc::new(PostgresFailureLog::new(pool)),
        checkout_gateway: Arc::new(StripeCheckoutGateway::new(StripeConfig::new(
            config.payment.stripe_api_key.clone(),
        ))),
        payment: config.payment.clone(),
        environment: config.server.environment,
        // Must elapse before the outer TimeoutLayer so a slow delivery is
        // acknowledged as a retryable 5xx rather than cut off mid-flight.
        processing_timeout: config
            .server
            .request_timeout()
            .saturating_sub(std::time::Duration::from_secs(1))
            .max(std::time::Duration::from_secs(1)),
    };

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config))
        .layer(TimeoutLayer::new(config.server.request_timeout()));

    let app = api_router().layer(middleware).with_state(state);

    let addr = config.server.socket_addr();
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = config.server.cors_origins_list();
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
