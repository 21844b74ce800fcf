use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use fotoai_pipeline::{PipelineError, ProcessRequest, ProcessResponse};
use tracing::{Instrument, Span};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::BearerToken;
use crate::state::AppState;

/// POST /api/v1/process-image
///
/// Runs one enhancement for the bearer of the `Authorization` token. A body
/// that is not valid JSON fails like any other invalid request.
///
/// The run lives in its own task, so neither the response deadline nor a
/// client disconnect stops it before settlement.
pub async fn process_image(
    State(state): State<AppState>,
    token: BearerToken,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> AppResult<Json<ProcessResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        let detail = rejection.body_text();
        tracing::warn!(error = %detail, "Rejected malformed process-image body");
        PipelineError::InvalidRequest(detail)
    })?;

    let pipeline = state.pipeline.clone();
    let run = tokio::spawn(
        async move { pipeline.run(token.as_deref(), request).await }.instrument(Span::current()),
    );

    let deadline = Duration::from_secs(state.config.request_timeout_secs);
    match tokio::time::timeout(deadline, run).await {
        Ok(Ok(result)) => Ok(Json(result?)),
        Ok(Err(join_error)) => Err(AppError::Internal(join_error.to_string())),
        Err(_) => Err(AppError::TimedOut),
    }
}
