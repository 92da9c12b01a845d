//! `POST /send` and `POST /mock`.

use axum::body::Bytes;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use protolane_core::HeaderOverrides;
use protolane_core::parse_header_overrides;
use serde::Deserialize;

use crate::error::ServerError;
use crate::state::AppState;

const PAYLOAD_MEDIA_TYPES: [&str; 2] = ["application/x-protobuf", "application/octet-stream"];

/// Query string of `POST /send`.
#[derive(Debug, Default, Deserialize)]
pub struct SendParams {
    /// Destination URL.
    pub url: Option<String>,
    /// Header overrides as a JSON object of scalars.
    pub headers: Option<String>,
}

/// Relays the request body to `?url=` and mirrors the upstream answer.
///
/// The upstream status is re-emitted as-is; the body is always sent back as
/// `application/octet-stream`.
pub async fn send_payload(
    State(state): State<AppState>,
    Query(params): Query<SendParams>,
    request_headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ServerError> {
    let url = params
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or(ServerError::MissingUrl)?;

    if !is_binary_payload(&request_headers) {
        return Err(ServerError::InvalidPayload(
            "expected an application/x-protobuf or application/octet-stream body".to_string(),
        ));
    }

    let overrides = match params.headers.as_deref() {
        Some(raw) => parse_header_overrides(raw)
            .map_err(|e| ServerError::InvalidHeaders(e.to_string()))?,
        None => HeaderOverrides::new(),
    };

    let response = state
        .forwarder
        .forward(&url, body.to_vec(), &overrides)
        .await?;

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok((
        status,
        [(
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        )],
        response.body,
    )
        .into_response())
}

/// Echoes the body back as `application/x-protobuf`.
pub async fn mock_echo(body: Bytes) -> impl IntoResponse {
    tracing::debug!(bytes = body.len(), "mock payload received");
    (
        [(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-protobuf"),
        )],
        body,
    )
}

fn is_binary_payload(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase())
        .is_some_and(|mt| PAYLOAD_MEDIA_TYPES.contains(&mt.as_str()))
}
