//! Libris API server
//!
//! The single entry point for all external requests.
//! Handles:
//! - The GraphQL surface (queries, mutations, uploads)
//! - Rate limiting on the GraphQL endpoint
//! - The plain HTTP health endpoint
//! - The periodic aggregate reconciliation task
//! - Observability (logging, metrics)

mod graphql;
mod handlers;
mod middleware;
mod reconcile;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use libris_common::{
    config::AppConfig,
    db::{DbPool, Repository},
    docstore::{DocRepository, DocStore},
    images::ImageHost,
    metrics,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub schema: graphql::AppSchema,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;
    let config = Arc::new(config);

    // Initialize tracing
    init_tracing(&config);

    info!("Starting Libris API server v{}", libris_common::VERSION);

    // Initialize metrics
    metrics::register_metrics();

    // Initialize the relational store
    let db = DbPool::new(&config.database).await?;
    if config.is_development() {
        db.sync_schema().await?;
    }
    let repo = Repository::new(db);

    // Initialize the document store
    let store = DocStore::new(&config.docstore).await?;
    store.ensure_indexes().await?;
    let docs = DocRepository::new(store);

    // Image host client
    let images = ImageHost::new(&config.images);

    // Spawn the aggregate reconciliation task
    if config.reconcile.enabled {
        reconcile::spawn(repo.clone(), docs.clone(), config.reconcile_interval());
    }

    // Build the GraphQL schema and router
    let schema = graphql::build_schema(repo, docs, images, config.clone());
    let state = AppState {
        config: config.clone(),
        schema,
    };
    let app = create_router(state);

    // Start the server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize the tracing subscriber from configuration
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // The GraphQL endpoint carries the rate limit; the health endpoint
    // stays outside it.
    let mut graphql_routes = Router::new().route(
        "/graphql",
        post(graphql::graphql_handler).get(graphql::graphiql),
    );

    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.max_requests,
            state.config.rate_limit_window(),
        );
        graphql_routes = graphql_routes.layer(axum::middleware::from_fn(
            move |request: axum::extract::Request, next: axum::middleware::Next| {
                let limiter = limiter.clone();
                async move {
                    middleware::rate_limit::rate_limit_middleware(request, next, limiter).await
                }
            },
        ));
    }

    Router::new()
        .route("/health", get(handlers::health::health))
        .merge(graphql_routes)
        .layer(DefaultBodyLimit::max(state.config.server.body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
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
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
