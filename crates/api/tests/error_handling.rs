//! Tests for `AppError` → HTTP response mapping.
//!
//! These call `IntoResponse` directly; no server is involved.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use fotoai_api::error::AppError;
use fotoai_pipeline::PipelineError;
use http_body_util::BodyExt;
use serde_json::json;

/// Helper: convert an `AppError` into its status code and parsed JSON body.
async fn error_to_response(err: AppError) -> (StatusCode, serde_json::Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn every_failure_is_a_500_with_only_an_error_field() {
    let errors = [
        PipelineError::Unauthenticated,
        PipelineError::InsufficientCredits,
        PipelineError::MaintenanceMode("Voltamos em breve.".into()),
        PipelineError::UnknownCategory("roupas".into()),
        PipelineError::ServiceUnavailable {
            diagnostic: "connection refused".into(),
        },
    ];

    for err in errors {
        let expected = err.to_string();
        let (status, json) = error_to_response(err.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json, json!({ "error": expected }));
    }
}

#[tokio::test]
async fn provider_diagnostics_are_not_exposed() {
    let err = AppError::from(PipelineError::ProviderCallFailed {
        status: Some(502),
        diagnostic: "upstream trace id 7f3a".into(),
    });

    let (status, json) = error_to_response(err).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "Falha ao obter a imagem melhorada.");
    assert!(!json.to_string().contains("7f3a"));
}

#[tokio::test]
async fn maintenance_message_is_passed_through() {
    let err = AppError::from(PipelineError::MaintenanceMode(
        "Sistema em manutenção até as 18h.".into(),
    ));

    let (_, json) = error_to_response(err).await;

    assert_eq!(json["error"], "Sistema em manutenção até as 18h.");
}
