//! Recording Upload
//!
//! HTTP client for pushing a recording file to the replay server before
//! subscribing to it by filename. The server answers with a receipt whose
//! `filepath` is the name to use in the subscription request.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur while uploading a recording.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Reading the recording from disk failed.
    #[error("failed to read recording: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server refused the upload.
    #[error("upload rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code returned by the server.
        status: u16,
        /// Response body, for diagnosis.
        body: String,
    },

    /// Receipt body could not be parsed.
    #[error("invalid upload receipt: {0}")]
    InvalidReceipt(#[from] serde_json::Error),
}

// =============================================================================
// Upload Receipt
// =============================================================================

/// Server receipt for an uploaded recording.
///
/// # Wire Format (JSON)
/// ```json
/// {"id": "rec-1", "filepath": "uploads/fills.ndjson", "size": 2048}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    /// Server-assigned id for the recording.
    pub id: String,

    /// Path the server stored the recording under. Use as the subscription
    /// filename.
    pub filepath: String,

    /// Stored size in bytes.
    pub size: u64,
}

// =============================================================================
// Upload Client
// =============================================================================

/// HTTP client for recording uploads.
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    endpoint: String,
}

impl UploadClient {
    /// Create a client for the given upload endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }

    /// Upload a recording file and return the server's receipt.
    ///
    /// The file travels as a multipart form with a single `file` part named
    /// after the on-disk file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read, the request fails,
    /// the server answers with a non-success status, or the receipt cannot
    /// be parsed.
    pub async fn upload_path(&self, path: &Path) -> Result<UploadReceipt, UploadError> {
        let file_name = path.file_name().map_or_else(
            || "recording".to_string(),
            |name| name.to_string_lossy().into_owned(),
        );

        tracing::info!(path = %path.display(), endpoint = %self.endpoint, "uploading recording");

        let bytes = tokio::fs::read(path).await?;
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self.http.post(&self.endpoint).multipart(form).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UploadError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let receipt: UploadReceipt = serde_json::from_str(&body)?;
        tracing::info!(id = %receipt.id, filepath = %receipt.filepath, size = receipt.size, "recording uploaded");

        Ok(receipt)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_receipt() {
        let json = r#"{"id": "rec-1", "filepath": "uploads/fills.ndjson", "size": 2048}"#;
        let receipt: UploadReceipt = serde_json::from_str(json).unwrap();

        assert_eq!(receipt.id, "rec-1");
        assert_eq!(receipt.filepath, "uploads/fills.ndjson");
        assert_eq!(receipt.size, 2048);
    }

    #[test]
    fn test_deserialize_receipt_ignores_extras() {
        let json = r#"{"id": "rec-1", "filepath": "uploads/a.ndjson", "size": 1, "uploaded_at": "2024-01-01"}"#;
        let receipt: UploadReceipt = serde_json::from_str(json).unwrap();

        assert_eq!(receipt.id, "rec-1");
    }

    #[test]
    fn test_client_builds_with_timeout() {
        let client = UploadClient::new("http://127.0.0.1:8080/v1/upload", Duration::from_secs(5));
        assert!(client.is_ok());
    }
}
