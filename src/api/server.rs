use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::api::handlers::{
    commit_pedigree_verification, health_check, preview_pedigree_verification, recompute_score,
    trust_report, upload_health_document,
};
use crate::config::AppConfig;
use crate::db::create_pool;
use crate::registry::TestRegistry;
use crate::storage::{BlobStore, HttpBlobStore};
use crate::verifier::{HttpPedigreeVerifier, PedigreeVerifier};

/// Everything a request needs: the record store pool, the test-type
/// registry and the two external collaborators behind their traits.
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::PgPool,
    pub registry: Arc<TestRegistry>,
    pub verifier: Arc<dyn PedigreeVerifier>,
    pub storage: Arc<dyn BlobStore>,
}

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().json().with_target(false))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn,tower=warn")),
        )
        .init();
}

/// Wire the routes onto a state. Split out from `create_app` so tests
/// can inject stub collaborators.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/dogs/{dog_id}/health-records/{test_type}",
            post(upload_health_document),
        )
        .route(
            "/dogs/{dog_id}/pedigree/verification",
            get(preview_pedigree_verification).post(commit_pedigree_verification),
        )
        .route("/dogs/{dog_id}/score/recompute", post(recompute_score))
        .route("/dogs/{dog_id}/trust-report", get(trust_report))
        .route("/health", get(health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn create_app(config: AppConfig) -> Result<Router, Box<dyn std::error::Error>> {
    let registry = match &config.registry_path {
        Some(path) => {
            info!("Loading test registry from {}", path.display());
            TestRegistry::from_json_file(path)?
        }
        None => TestRegistry::builtin(),
    };

    let pool = create_pool(&config.database_url).await?;

    let state = AppState {
        pool,
        registry: Arc::new(registry),
        verifier: Arc::new(HttpPedigreeVerifier::new(
            &config.verifier_base_url,
            &config.verifier_name,
        )),
        storage: Arc::new(HttpBlobStore::new(
            &config.storage_base_url,
            &config.storage_bucket,
            config.storage_service_key.clone(),
        )),
    };

    Ok(build_router(state))
}

pub async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting BluBloodz trust scoring service");

    let config = AppConfig::from_env()?;
    let port = config.port;
    let app = create_app(config).await?;

    let shutdown = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C signal handler");
        info!("Shutting down gracefully...");
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
