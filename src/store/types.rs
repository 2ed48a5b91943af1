//! Shared types used by the summary store client.

use crate::pipeline::types::SummaryRecord;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while interacting with the summary store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid summary store URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The referenced summary does not exist for this user.
    #[error("Summary not found")]
    NotFound,
    /// Store responded with an unexpected status code.
    #[error("Unexpected store response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from the store.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// A summary as persisted by the store, with identity and timestamps attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSummary {
    /// Opaque unique identifier of the summary.
    pub id: String,
    /// Identity of the owning user.
    pub user_id: String,
    /// Summary content and provenance fields.
    #[serde(flatten)]
    pub record: SummaryRecord,
    /// Creation timestamp, RFC3339. Set once.
    pub created_at: String,
    /// Last-update timestamp, RFC3339. Set once; this flow never mutates summaries.
    pub updated_at: String,
}

#[derive(Deserialize)]
pub(crate) struct ListSummariesResponse {
    pub(crate) summaries: Vec<StoredSummary>,
}
