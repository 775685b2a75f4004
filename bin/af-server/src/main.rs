//! APIForge Server
//!
//! Production server for the administrative REST surface and the bridge
//! proxy:
//! - Admin APIs: generic CRUD over every registered resource type
//! - Bridge: matches live requests to registered bridging services
//! - Monitoring APIs: health, metrics, readiness
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AF_API_PORT` | `8080` | HTTP API port |
//! | `AF_METRICS_PORT` | `9090` | Metrics/health port |
//! | `AF_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `AF_MONGO_DB` | `apiforge` | MongoDB database name |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use af_admin::api::admin::admin_router;
use af_admin::api::bridge::bridge_router;
use af_admin::api::openapi::AdminApiDoc;
use af_admin::api::AppState;
use af_admin::auth::MongoAuthStore;
use af_admin::repository::MongoRecordStore;
use af_admin::resources::build_registry;
use af_common::TracingNotifier;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting APIForge Server");

    let api_port: u16 = env_or_parse("AF_API_PORT", 8080);
    let metrics_port: u16 = env_or_parse("AF_METRICS_PORT", 9090);
    let mongo_url = env_or("AF_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("AF_MONGO_DB", "apiforge");

    info!("Connecting to MongoDB: {}/{}", mongo_url, mongo_db);
    let mongo_client = mongodb::Client::with_uri_str(&mongo_url).await?;
    let db = mongo_client.database(&mongo_db);

    let registry = Arc::new(build_registry());
    info!("Resource registry initialized: {:?}", registry.tokens());

    let state = AppState {
        registry,
        store: Arc::new(MongoRecordStore::new(db.clone())),
        auth: Arc::new(MongoAuthStore::new(&db)),
        notifier: Arc::new(TracingNotifier),
    };

    let app = Router::new()
        .nest("/admin", admin_router())
        .nest("/bridge", bridge_router())
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", AdminApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let api_listener = TcpListener::bind(&api_addr).await?;
    let api_task = tokio::spawn(async move {
        axum::serve(api_listener, app).await.unwrap();
    });

    let metrics_addr = format!("0.0.0.0:{}", metrics_port);
    info!("Metrics server listening on http://{}/metrics", metrics_addr);

    let metrics_app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler));

    let metrics_listener = TcpListener::bind(&metrics_addr).await?;
    let metrics_task = tokio::spawn(async move {
        axum::serve(metrics_listener, metrics_app).await.unwrap();
    });

    info!("APIForge Server started");
    info!("Press Ctrl+C to shutdown");

    shutdown_signal().await;
    info!("Shutdown signal received...");

    api_task.abort();
    metrics_task.abort();

    info!("APIForge Server shutdown complete");
    Ok(())
}

async fn metrics_handler() -> &'static str {
    "# HELP af_server_up Server is up\n# TYPE af_server_up gauge\naf_server_up 1\n"
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn ready_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "READY"
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
