use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fotoai_pipeline::PipelineError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Every failure leaves the service as HTTP 500 with `{ "error": <message> }`,
/// so callers render one failure state. The message is the error's `Display`
/// text; diagnostics stay in the logs.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The response deadline passed. The run keeps going in the background.
    #[error("O processamento excedeu o tempo limite.")]
    TimedOut,

    /// The processing task panicked or was aborted.
    #[error("Erro interno do servidor.")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            // Already logged with its diagnostic by the pipeline.
            AppError::Pipeline(_) => {}
            AppError::TimedOut => {
                tracing::warn!("Processing response deadline passed; run continues detached");
            }
            AppError::Internal(detail) => {
                tracing::error!(error = %detail, "Processing task failed");
            }
        }
        error_response(&self.to_string())
    }
}

/// The one failure envelope the service ever returns.
pub fn error_response(message: &str) -> Response {
    let body = json!({ "error": message });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(body)).into_response()
}
