//! Route tests driving the router with `tower::ServiceExt::oneshot`.
//!
//! The compiler and the relay transport are replaced with in-process fakes, so
//! these tests need neither `protoc` nor network access.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::io;
use std::net::IpAddr;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::Request;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;
use protolane_core::ArchiveExtractor;
use protolane_core::CompilerConfig;
use protolane_core::HostPolicyMode;
use protolane_core::Invocation;
use protolane_core::ProcessOutput;
use protolane_core::ProcessRunner;
use protolane_core::RelayForwarder;
use protolane_core::SchemaCompiler;
use protolane_core::TempScratch;
use protolane_core::relay::HostResolver;
use protolane_core::relay::OutboundRequest;
use protolane_core::relay::RelayTransport;
use protolane_core::relay::UpstreamResponse;
use protolane_core::test_utils::zip_of;
use protolane_server::AppState;
use protolane_server::ServerConfig;
use protolane_server::create_router;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "protolane-test-boundary";

/// Writes `DESC` followed by the file arguments, or fails when a file named
/// `broken.proto` is present.
#[derive(Debug)]
struct FakeCompiler;

impl ProcessRunner for FakeCompiler {
    fn run(&self, invocation: &Invocation) -> io::Result<ProcessOutput> {
        let args: Vec<String> = invocation
            .args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        if args.iter().any(|a| a == "broken.proto") {
            return Ok(ProcessOutput {
                exit_code: Some(1),
                stdout: Vec::new(),
                stderr: b"broken.proto:1:1: Expected top-level statement.\n".to_vec(),
            });
        }
        let out = args
            .iter()
            .find_map(|a| a.strip_prefix("--descriptor_set_out="))
            .expect("output flag");
        let files: Vec<&str> = args
            .iter()
            .filter(|a| !a.starts_with("--"))
            .map(String::as_str)
            .collect();
        fs::write(out, format!("DESC:{}", files.join(",")))?;
        Ok(ProcessOutput {
            exit_code: Some(0),
            ..ProcessOutput::default()
        })
    }
}

#[derive(Debug)]
struct PublicResolver;

#[async_trait]
impl HostResolver for PublicResolver {
    async fn resolve(&self, _host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        let ip: IpAddr = "93.184.216.34".parse().unwrap();
        Ok(vec![SocketAddr::new(ip, port)])
    }
}

#[derive(Debug, Default)]
struct FakeUpstream {
    seen: Mutex<Vec<OutboundRequest>>,
}

#[async_trait]
impl RelayTransport for FakeUpstream {
    async fn post(&self, request: OutboundRequest) -> protolane_core::Result<UpstreamResponse> {
        let mut body = b"echo:".to_vec();
        body.extend_from_slice(&request.body);
        self.seen.lock().unwrap().push(request);
        let mut headers = HeaderMap::new();
        headers.insert("x-upstream", HeaderValue::from_static("1"));
        Ok(UpstreamResponse {
            status: 201,
            headers,
            body,
        })
    }
}

struct Harness {
    app: Router,
    scratch: TempDir,
    upstream: Arc<FakeUpstream>,
}

fn harness(config: ServerConfig) -> Harness {
    let scratch = TempDir::new().unwrap();
    let upstream = Arc::new(FakeUpstream::default());
    let state = AppState::with_services(
        &config,
        ArchiveExtractor::new(Arc::new(TempScratch::new(scratch.path()))),
        SchemaCompiler::with_runner(&CompilerConfig::default(), Arc::new(FakeCompiler)),
        RelayForwarder::with_parts(
            config.host_policy,
            Arc::new(PublicResolver),
            upstream.clone(),
        ),
    );
    Harness {
        app: create_router(state),
        scratch,
        upstream,
    }
}

fn default_harness() -> Harness {
    harness(ServerConfig::default())
}

fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn parse_request(body: Vec<u8>) -> Request<Body> {
    Request::post("/parse")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn send_request(query: &str, content_type: Option<&str>, body: &[u8]) -> Request<Body> {
    let mut builder = Request::post(format!("/send?{query}"));
    if let Some(ct) = content_type {
        builder = builder.header(CONTENT_TYPE, ct);
    }
    builder.body(Body::from(body.to_vec())).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1 << 20)
        .await
        .unwrap()
        .to_vec()
}

async fn error_code(response: Response) -> String {
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    json["code"].as_str().unwrap().to_string()
}

fn scratch_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn health_returns_ok() {
    let h = default_harness();
    let response = h
        .app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn parse_returns_descriptor_and_file_list() {
    let h = default_harness();
    let archive = zip_of(&[
        ("b/z.proto", b"syntax = \"proto3\";"),
        ("a.proto", b"syntax = \"proto3\";"),
        ("notes.txt", b"skip"),
    ]);

    let response = h
        .app
        .oneshot(parse_request(multipart_body(
            "file",
            "schemas.zip",
            "application/zip",
            &archive,
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");
    assert_eq!(
        response.headers()["x-proto-files"],
        "%5B%22a.proto%22%2C%22b%2Fz.proto%22%5D"
    );
    assert_eq!(body_bytes(response).await, b"DESC:a.proto,b/z.proto");
    assert!(scratch_is_empty(h.scratch.path()));
}

#[tokio::test]
async fn parse_accepts_zip_by_file_name() {
    let h = default_harness();
    let archive = zip_of(&[("x.proto", b"syntax = \"proto3\";")]);
    let response = h
        .app
        .oneshot(parse_request(multipart_body(
            "file",
            "upload.ZIP",
            "application/octet-stream",
            &archive,
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn parse_rejects_non_zip_upload() {
    let h = default_harness();
    let response = h
        .app
        .oneshot(parse_request(multipart_body(
            "file",
            "notes.txt",
            "text/plain",
            b"hello",
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "INVALID_ZIP_FILE");
}

#[tokio::test]
async fn parse_without_file_part_is_empty_upload() {
    let h = default_harness();
    let response = h
        .app
        .oneshot(parse_request(multipart_body(
            "other",
            "schemas.zip",
            "application/zip",
            b"PK",
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "EMPTY_ZIP_FILE");
}

#[tokio::test]
async fn parse_traversal_is_rejected_and_cleaned_up() {
    let h = default_harness();
    let archive = zip_of(&[("ok.proto", b"x"), ("../evil.proto", b"x")]);
    let response = h
        .app
        .oneshot(parse_request(multipart_body(
            "file",
            "evil.zip",
            "application/zip",
            &archive,
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "PATH_TRAVERSAL");
    assert!(scratch_is_empty(h.scratch.path()));
    assert!(!h.scratch.path().join("../evil.proto").exists());
}

#[tokio::test]
async fn parse_enforces_entry_limit() {
    let h = harness(ServerConfig {
        max_entries: 1,
        ..ServerConfig::default()
    });
    let archive = zip_of(&[("a.proto", b"1"), ("b.proto", b"2")]);
    let response = h
        .app
        .oneshot(parse_request(multipart_body(
            "file",
            "two.zip",
            "application/zip",
            &archive,
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "TOO_MANY_ENTRIES");
}

#[tokio::test]
async fn parse_reports_compiler_diagnostics() {
    let h = default_harness();
    let archive = zip_of(&[("broken.proto", b"not a schema")]);
    let response = h
        .app
        .oneshot(parse_request(multipart_body(
            "file",
            "broken.zip",
            "application/zip",
            &archive,
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["code"], "COMPILER_FAILURE");
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("Expected top-level statement")
    );
    assert!(scratch_is_empty(h.scratch.path()));
}

#[tokio::test]
async fn parse_rejects_oversized_upload() {
    let h = harness(ServerConfig {
        max_upload: 1024,
        ..ServerConfig::default()
    });
    let response = h
        .app
        .oneshot(parse_request(multipart_body(
            "file",
            "big.zip",
            "application/zip",
            &vec![0_u8; 4096],
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn send_relays_and_mirrors_status() {
    let h = default_harness();
    let response = h
        .app
        .oneshot(send_request(
            "url=https%3A%2F%2Fapi.example.com%2Fingest&headers=%7B%22x-token%22%3A%22abc%22%2C%22x-n%22%3A3%7D",
            Some("application/x-protobuf"),
            b"\x08\x96\x01",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/octet-stream");
    assert_eq!(body_bytes(response).await, b"echo:\x08\x96\x01");

    let seen = h.upstream.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].url.as_str(), "https://api.example.com/ingest");
    assert_eq!(seen[0].headers["x-token"], "abc");
    assert_eq!(seen[0].headers["x-n"], "3");
    assert_eq!(seen[0].headers[CONTENT_TYPE], "application/x-protobuf");
}

#[tokio::test]
async fn send_requires_url() {
    let h = default_harness();
    let response = h
        .app
        .oneshot(send_request("", Some("application/x-protobuf"), b"x"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "SEND_INVALID_URL");
}

#[tokio::test]
async fn send_requires_binary_body() {
    let h = default_harness();
    let response = h
        .app
        .oneshot(send_request(
            "url=https%3A%2F%2Fexample.com%2F",
            Some("application/json"),
            b"{}",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "SEND_INVALID_PAYLOAD");
}

#[tokio::test]
async fn send_rejects_malformed_headers() {
    let h = default_harness();
    let response = h
        .app
        .oneshot(send_request(
            "url=https%3A%2F%2Fexample.com%2F&headers=not-json",
            Some("application/octet-stream"),
            b"x",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "SEND_INVALID_HEADER");
}

#[tokio::test]
async fn send_blocks_internal_destinations_when_restricted() {
    let h = default_harness();
    for target in [
        "http%3A%2F%2Flocalhost%2Fx",
        "http%3A%2F%2F192.168.1.10%2Fapi",
        "http%3A%2F%2F169.254.169.254%2Flatest%2Fmeta-data",
    ] {
        let response = h
            .app
            .clone()
            .oneshot(send_request(
                &format!("url={target}"),
                Some("application/x-protobuf"),
                b"x",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{target}");
        assert_eq!(error_code(response).await, "FORBIDDEN_HOST");
    }
    assert!(h.upstream.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn send_allows_internal_destinations_when_open() {
    let h = harness(ServerConfig {
        host_policy: HostPolicyMode::Open,
        ..ServerConfig::default()
    });
    let response = h
        .app
        .oneshot(send_request(
            "url=http%3A%2F%2Flocalhost%3A3000%2Fmock",
            Some("application/x-protobuf"),
            b"x",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn send_rejects_unsupported_scheme() {
    let h = default_harness();
    let response = h
        .app
        .oneshot(send_request(
            "url=file%3A%2F%2F%2Fetc%2Fpasswd",
            Some("application/x-protobuf"),
            b"x",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(response).await, "INVALID_URL");
}

#[tokio::test]
async fn mock_is_routed_only_when_enabled() {
    let disabled = default_harness();
    let response = disabled
        .app
        .oneshot(
            Request::post("/mock")
                .body(Body::from("ping"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let enabled = harness(ServerConfig {
        enable_mock: true,
        ..ServerConfig::default()
    });
    let response = enabled
        .app
        .oneshot(
            Request::post("/mock")
                .header(CONTENT_TYPE, "application/x-protobuf")
                .body(Body::from(&b"\x0a\x02hi"[..]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/x-protobuf");
    assert_eq!(body_bytes(response).await, b"\x0a\x02hi");
}
