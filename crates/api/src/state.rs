use std::sync::Arc;

use fotoai_core::ports::ObjectStore;
use fotoai_pipeline::EnhancementPipeline;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool, storage and pipeline are handle types.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: fotoai_db::DbPool,
    /// Object storage, the same handle the pipeline writes through.
    pub storage: Arc<dyn ObjectStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The enhancement pipeline with its collaborators wired in.
    pub pipeline: EnhancementPipeline,
}
