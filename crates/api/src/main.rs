use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fotoai_api::auth::JwtIdentityVerifier;
use fotoai_api::background::orphan_sweep::{self, SweepConfig};
use fotoai_api::config::ServerConfig;
use fotoai_api::router::build_app_router;
use fotoai_api::state::AppState;
use fotoai_core::ports::ObjectStore;
use fotoai_db::adapters::PgStore;
use fotoai_pipeline::{Collaborators, EnhancementPipeline, PipelineOptions};
use fotoai_providers::{FalClient, HttpFetcher, ProviderConfig};
use fotoai_storage::{StorageClient, StorageConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // LOG_FORMAT=json switches to one JSON object per line.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "fotoai_api=debug,fotoai_pipeline=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(env_filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let storage_config = StorageConfig::from_env();
    let provider_config = ProviderConfig::from_env();
    let options = PipelineOptions::from_env();
    let sweep_config = SweepConfig::from_env();
    tracing::info!(
        model = %provider_config.model_name,
        failure_policy = ?options.failure_policy,
        composite_mode = options.composite_mode.as_str(),
        "Loaded pipeline configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = fotoai_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    fotoai_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    fotoai_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Collaborators ---
    let storage = StorageClient::new(&storage_config).expect("Failed to build storage client");
    let fal = Arc::new(FalClient::new(&provider_config).expect("Failed to build provider client"));
    let fetcher =
        HttpFetcher::new(provider_config.timeout_secs).expect("Failed to build artifact fetcher");
    let store = Arc::new(PgStore::new(pool.clone()));
    let object_store: Arc<dyn ObjectStore> = Arc::new(storage.clone());

    let pipeline = EnhancementPipeline::new(
        Collaborators {
            identity: Arc::new(JwtIdentityVerifier::new(config.jwt.clone())),
            credits: store.clone(),
            settings: store.clone(),
            results: store,
            storage: object_store.clone(),
            enhancer: fal.clone(),
            remover: fal.clone(),
            generator: fal,
            fetcher: Arc::new(fetcher),
        },
        options,
    );

    // --- Orphan sweep ---
    let sweep_cancel = CancellationToken::new();
    let sweep_handle = if sweep_config.enabled {
        Some(tokio::spawn(orphan_sweep::run(
            storage,
            pool.clone(),
            sweep_config,
            sweep_cancel.clone(),
        )))
    } else {
        tracing::info!("Orphan sweep disabled");
        None
    };

    // --- App state ---
    let state = AppState {
        pool,
        storage: object_store,
        config: Arc::new(config.clone()),
        pipeline,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    if let Some(handle) = sweep_handle {
        let _ = tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), handle).await;
        tracing::info!("Orphan sweep stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
