/// Errors reported by collaborator ports (auth, storage, data store).
///
/// The pipeline translates these into its own taxonomy depending on which
/// stage observed them, so the variants stay deliberately coarse.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
