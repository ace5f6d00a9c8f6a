//! File Upload Integration Tests
//!
//! Tests the multipart recording upload against a mock HTTP server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use replay_client::{UploadClient, UploadError};

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Write a recording fixture and return its handle.
fn recording_fixture(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file.flush().unwrap();
    file
}

#[tokio::test]
async fn upload_returns_parsed_receipt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "rec-42",
            "filepath": "recordings/rec-42.jsonl",
            "size": 27
        })))
        .expect(1)
        .mount(&server)
        .await;

    let file = recording_fixture(b"{\"price\":\"1\",\"quantity\":1}\n");
    let client = UploadClient::new(format!("{}/v1/upload", server.uri()), UPLOAD_TIMEOUT).unwrap();

    let receipt = client.upload_path(file.path()).await.unwrap();
    assert_eq!(receipt.id, "rec-42");
    assert_eq!(receipt.filepath, "recordings/rec-42.jsonl");
    assert_eq!(receipt.size, 27);

    // The request carried the recording as a multipart part named "file"
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(r#"name="file""#));
    assert!(body.contains("filename=\""));
    assert!(body.contains(r#"{"price":"1","quantity":1}"#));
}

#[tokio::test]
async fn server_rejection_surfaces_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/upload"))
        .respond_with(ResponseTemplate::new(507).set_body_string("disk full"))
        .mount(&server)
        .await;

    let file = recording_fixture(b"x");
    let client = UploadClient::new(format!("{}/v1/upload", server.uri()), UPLOAD_TIMEOUT).unwrap();

    let err = client.upload_path(file.path()).await.unwrap_err();
    let UploadError::Rejected { status, body } = err else {
        panic!("expected rejection, got {err:?}");
    };
    assert_eq!(status, 507);
    assert_eq!(body, "disk full");
}

#[tokio::test]
async fn missing_recording_is_an_io_error() {
    let client = UploadClient::new("http://127.0.0.1:1/v1/upload", UPLOAD_TIMEOUT).unwrap();

    let err = client
        .upload_path(std::path::Path::new("/does/not/exist.jsonl"))
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Io(_)));
}

#[tokio::test]
async fn malformed_receipt_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let file = recording_fixture(b"x");
    let client = UploadClient::new(format!("{}/v1/upload", server.uri()), UPLOAD_TIMEOUT).unwrap();

    let err = client.upload_path(file.path()).await.unwrap_err();
    assert!(matches!(err, UploadError::InvalidReceipt(_)));
}
