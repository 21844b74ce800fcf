pub mod health;
pub mod process;

use axum::routing::post;
use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Health routes are mounted separately at the root level.
///
/// ```text
/// /process-image    POST  enhance an uploaded image
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/process-image", post(process::process_image))
}
