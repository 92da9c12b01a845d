//! `POST /parse`: archive upload to descriptor set.

use axum::extract::Multipart;
use axum::extract::State;
use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::http::HeaderName;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use protolane_core::CompiledDescriptor;

use crate::error::ServerError;
use crate::state::AppState;

/// Response header listing the compiled schema files.
pub const PROTO_FILES_HEADER: &str = "x-proto-files";

const ZIP_MEDIA_TYPES: [&str; 2] = ["application/zip", "application/x-zip-compressed"];

/// Extracts the uploaded archive, compiles it, and returns the descriptor set.
///
/// The body is the descriptor bytes; `X-Proto-Files` carries the schema file
/// list as a percent-encoded JSON array. Extraction and compilation run on
/// the blocking pool, at most `max_concurrent_compilations` at a time.
pub async fn parse_archive(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ServerError> {
    let mut multipart = multipart.map_err(|_| ServerError::EmptyUpload)?;
    let archive = read_upload(&mut multipart, state.max_upload).await?;

    let permit = state
        .compile_permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| ServerError::Worker(e.to_string()))?;

    let AppState {
        extractor,
        compiler,
        limits,
        ..
    } = state;
    let (descriptor, files) = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let extracted = extractor.extract(&archive, &limits)?;
        let descriptor = compiler.compile(extracted.output_dir())?;
        let files = extracted.schema_files().to_vec();
        if let Err(e) = extracted.close() {
            tracing::warn!(error = %e, "failed to release scratch directory");
        }
        Ok::<(CompiledDescriptor, Vec<String>), protolane_core::Error>((descriptor, files))
    })
    .await
    .map_err(|e| ServerError::Worker(e.to_string()))??;

    tracing::info!(
        files = files.len(),
        bytes = descriptor.len(),
        "descriptor set returned"
    );
    let headers = [
        (
            CONTENT_TYPE,
            HeaderValue::from_static("application/octet-stream"),
        ),
        (
            HeaderName::from_static(PROTO_FILES_HEADER),
            encode_file_list(&files)?,
        ),
    ];
    Ok((StatusCode::OK, headers, descriptor.into_bytes()).into_response())
}

/// Encodes the schema file list as a percent-encoded JSON array.
///
/// Decodable with `decodeURIComponent`: spaces become `%20`, not `+`.
pub fn encode_file_list(files: &[String]) -> Result<HeaderValue, ServerError> {
    let json = serde_json::to_string(files).map_err(|e| ServerError::Worker(e.to_string()))?;
    let encoded: String = url::form_urlencoded::byte_serialize(json.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    HeaderValue::from_str(&encoded).map_err(|e| ServerError::Worker(e.to_string()))
}

async fn read_upload(multipart: &mut Multipart, max: usize) -> Result<Vec<u8>, ServerError> {
    let to_error = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::UploadTooLarge { max }
        } else {
            ServerError::InvalidUpload(e.body_text())
        }
    };

    while let Some(mut field) = multipart.next_field().await.map_err(to_error)? {
        if field.name() != Some("file") {
            continue;
        }
        if !is_zip_upload(field.content_type(), field.file_name()) {
            return Err(ServerError::InvalidUpload(
                "only ZIP archives are accepted".to_string(),
            ));
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(to_error)? {
            if data.len() + chunk.len() > max {
                return Err(ServerError::UploadTooLarge { max });
            }
            data.extend_from_slice(&chunk);
        }
        tracing::debug!(bytes = data.len(), "archive upload received");
        return Ok(data);
    }

    Err(ServerError::EmptyUpload)
}

fn is_zip_upload(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    let media_type = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());
    if media_type.is_some_and(|mt| ZIP_MEDIA_TYPES.contains(&mt.as_str())) {
        return true;
    }
    file_name.is_some_and(|name| name.to_ascii_lowercase().ends_with(".zip"))
}
