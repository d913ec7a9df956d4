use archive_router::config::RouterConfig;
use archive_router::{AppState, create_app};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::TempDir;
use tower::ServiceExt;
use zip::write::FileOptions;

const BOUNDARY: &str = "---------------------------archiverouterboundary";

fn build_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, FileOptions::default()).unwrap();
        } else {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\n\
            Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
            Content-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>, trace_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/upload/")
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(id) = trace_id {
        builder = builder.header("X-Trace-ID", id);
    }
    builder.body(Body::from(body)).unwrap()
}

fn setup(root: &Path) -> Router {
    create_app(AppState::new(RouterConfig::development(root)))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let trace_id = response
        .headers()
        .get("x-trace-id")
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, trace_id, json)
}

#[tokio::test]
async fn test_upload_routes_files_by_extension() {
    let media = TempDir::new().unwrap();
    let app = setup(media.path());

    let archive = build_zip(&[
        ("photo.JPG", "fake jpg content"),
        ("doc.pdf", "fake pdf content"),
        ("notes.txt", "plain text"),
        ("image.png", "fake png content"),
    ]);
    let (status, _, json) = send(
        &app,
        upload_request(multipart_body("file", "test.zip", "application/zip", &archive), None),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "body: {}", json);
    assert_eq!(json["written"], 4);
    assert_eq!(json["failed"], 0);
    assert_eq!(json["archive"], "test.zip");

    assert!(media.path().join("jpg/photo.JPG").is_file());
    assert!(media.path().join("pdf/doc.pdf").is_file());
    assert!(media.path().join("others/notes.txt").is_file());
    assert!(media.path().join("png/image.png").is_file());

    let outcomes = json["outcomes"].as_array().unwrap();
    let entries: Vec<&str> = outcomes.iter().map(|o| o["entry"].as_str().unwrap()).collect();
    assert_eq!(entries, ["photo.JPG", "doc.pdf", "notes.txt", "image.png"]);
    assert!(outcomes.iter().all(|o| o["outcome"] == "written"));
}

#[tokio::test]
async fn test_nested_entries_are_flattened() {
    let media = TempDir::new().unwrap();
    let app = setup(media.path());

    let archive = build_zip(&[("folder/", ""), ("folder/inner.txt", "inner")]);
    let (status, _, json) = send(
        &app,
        upload_request(multipart_body("file", "nested.zip", "application/zip", &archive), None),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["skipped"], 1);
    assert_eq!(json["written"], 1);
    assert_eq!(json["outcomes"][0]["outcome"], "skipped");
    assert_eq!(json["outcomes"][0]["reason"], "directory");
    assert!(media.path().join("others/inner.txt").is_file());
    assert!(!media.path().join("others/folder").exists());
}

#[tokio::test]
async fn test_traversal_entries_reported_not_written() {
    let sandbox = TempDir::new().unwrap();
    let media = sandbox.path().join("media");
    let app = setup(&media);

    let archive = build_zip(&[
        ("../../etc/passwd", "root:x:0:0"),
        ("keep.pdf", "%PDF"),
    ]);
    let (status, _, json) = send(
        &app,
        upload_request(multipart_body("file", "evil.zip", "application/zip", &archive), None),
    )
    .await;

    // Partial failure is still a completed batch
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["failed"], 1);
    assert_eq!(json["outcomes"][0]["outcome"], "failed");
    assert_eq!(json["outcomes"][0]["reason"], "unsafe-path");
    assert!(media.join("pdf/keep.pdf").is_file());
    assert!(!sandbox.path().join("etc").exists());
}

#[tokio::test]
async fn test_corrupt_archive_is_rejected() {
    let media = TempDir::new().unwrap();
    let app = setup(media.path());

    let (status, _, json) = send(
        &app,
        upload_request(
            multipart_body("file", "broken.zip", "application/zip", b"PK but not really a zip"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("ZIP"));
    assert_eq!(std::fs::read_dir(media.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_non_zip_name_is_rejected() {
    let media = TempDir::new().unwrap();
    let app = setup(media.path());

    let archive = build_zip(&[("a.txt", "a")]);
    let (status, _, json) = send(
        &app,
        upload_request(multipart_body("file", "a.tar", "application/zip", &archive), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Only ZIP archives are supported");
}

#[tokio::test]
async fn test_missing_file_field_is_rejected() {
    let media = TempDir::new().unwrap();
    let app = setup(media.path());

    let archive = build_zip(&[("a.txt", "a")]);
    let (status, _, json) = send(
        &app,
        upload_request(multipart_body("attachment", "a.zip", "application/zip", &archive), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No file uploaded");
}

#[tokio::test]
async fn test_empty_upload_is_rejected() {
    let media = TempDir::new().unwrap();
    let app = setup(media.path());

    let (status, _, _) = send(
        &app,
        upload_request(multipart_body("file", "empty.zip", "application/zip", b""), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let media = TempDir::new().unwrap();
    let mut config = RouterConfig::development(media.path());
    config.max_file_size = 16;
    let app = create_app(AppState::new(config));

    let big = "x".repeat(256);
    let archive = build_zip(&[("big.txt", big.as_str())]);
    let (status, _, _) = send(
        &app,
        upload_request(multipart_body("file", "big.zip", "application/zip", &archive), None),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_inbound_trace_id_is_echoed() {
    let media = TempDir::new().unwrap();
    let app = setup(media.path());

    let archive = build_zip(&[("a.png", "png")]);
    let (status, trace_id, json) = send(
        &app,
        upload_request(
            multipart_body("file", "traced.zip", "application/zip", &archive),
            Some("client-supplied-123"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(trace_id.as_deref(), Some("client-supplied-123"));
    assert_eq!(json["trace_id"], "client-supplied-123");
}

#[tokio::test]
async fn test_trace_id_minted_when_absent() {
    let media = TempDir::new().unwrap();
    let app = setup(media.path());

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let trace_id = response.headers().get("x-trace-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(trace_id).is_ok());

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["writable"], true);
    assert_eq!(json["subtrees"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_error_responses_carry_trace_id() {
    let media = TempDir::new().unwrap();
    let app = setup(media.path());

    let (status, trace_id, _) = send(
        &app,
        upload_request(
            multipart_body("file", "broken.zip", "application/zip", b"garbage"),
            Some("failing-request"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(trace_id.as_deref(), Some("failing-request"));
}

#[tokio::test]
async fn test_unbounded_size_limit_builds_router() {
    let media = TempDir::new().unwrap();
    let mut config = RouterConfig::development(media.path());
    config.max_file_size = usize::MAX;
    let app = create_app(AppState::new(config));

    let archive = build_zip(&[("doc.pdf", "pdf")]);
    let (status, _, json) = send(
        &app,
        upload_request(
            multipart_body("file", "big-limit.zip", "application/zip", &archive),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["written"], 1);
}
