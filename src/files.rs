//! Download of already-uploaded files from the storage service.

use reqwest::{Client, StatusCode};
use thiserror::Error;

/// Errors raised while downloading an uploaded file.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Storage service responded with an unexpected status code.
    #[error("Unexpected storage response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the storage service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Thin client for fetching uploaded documents by URL.
///
/// File storage is an opaque collaborator: callers hand us a `fileUrl` produced by the
/// upload flow and we fetch the raw bytes from it.
pub struct FileFetcher {
    client: Client,
}

impl FileFetcher {
    /// Wrap a shared HTTP client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download the raw bytes behind a file URL.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = FetchError::UnexpectedStatus { status, body };
            tracing::error!(url, error = %error, "Failed to download file");
            return Err(error);
        }

        let bytes = response.bytes().await?;
        tracing::debug!(url, size = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }
}
