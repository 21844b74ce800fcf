use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// What `/health` reports about the service's two stateful dependencies.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when both dependencies answer, `degraded` otherwise.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub storage_healthy: bool,
}

/// GET /health
///
/// Probes the database and object storage concurrently. Always 200; load
/// balancers read `status`.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (db, storage) = tokio::join!(
        fotoai_db::health_check(&state.pool),
        state.storage.health_check(),
    );

    if let Err(e) = &db {
        tracing::warn!(error = %e, "Database health check failed");
    }
    if let Err(e) = &storage {
        tracing::warn!(error = %e, "Storage health check failed");
    }

    let db_healthy = db.is_ok();
    let storage_healthy = storage.is_ok();

    Json(HealthResponse {
        status: if db_healthy && storage_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        storage_healthy,
    })
}

/// Mounted at the root, outside `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
