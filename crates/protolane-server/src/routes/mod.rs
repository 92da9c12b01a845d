//! Axum route handlers for the protolane API.

mod parse;
mod send;

pub use parse::PROTO_FILES_HEADER;
pub use parse::encode_file_list;
pub use parse::parse_archive;
pub use send::SendParams;
pub use send::mock_echo;
pub use send::send_payload;

use axum::Json;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::routing::post;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the application router.
pub fn create_router(state: AppState) -> Router {
    let upload_limit = state.max_upload.saturating_add(MULTIPART_OVERHEAD);
    let payload_limit = state.max_payload;

    let mut router = Router::new()
        .route("/health", get(health))
        .route(
            "/parse",
            post(parse_archive).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/send",
            post(send_payload).layer(DefaultBodyLimit::max(payload_limit)),
        );
    if state.enable_mock {
        router = router.route(
            "/mock",
            post(mock_echo).layer(DefaultBodyLimit::max(payload_limit)),
        );
    }

    router
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// `GET /health`: liveness probe.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}
