//! HTTP client wrapper for the summary store service.
//!
//! The store is an opaque collaborator exposing a per-user summaries resource. The
//! client generates summary identity and timestamps before writing, so a successful
//! insert always round-trips a complete record. Store errors propagate unchanged: no
//! retry, no rollback beyond what the store itself provides.

use crate::config::get_config;
use crate::pipeline::types::SummaryRecord;
use crate::store::types::{ListSummariesResponse, StoreError, StoredSummary};
use reqwest::{Client, Method, StatusCode};
use time::OffsetDateTime;
use uuid::Uuid;

/// Lightweight HTTP client for summary store operations.
pub struct SummaryStore {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl SummaryStore {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, StoreError> {
        let config = get_config();
        let client = Client::builder().user_agent("studysum/0.1").build()?;

        let base_url =
            normalize_base_url(&config.summary_store_url).map_err(StoreError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = %config
                .summary_store_api_key
                .as_deref()
                .map(|value| !value.is_empty())
                .unwrap_or(false),
            "Initialized summary store client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.summary_store_api_key.clone(),
        })
    }

    /// Persist a new summary for the given user and return the stored record.
    pub async fn insert_summary(
        &self,
        user_id: &str,
        record: SummaryRecord,
    ) -> Result<StoredSummary, StoreError> {
        let now = current_timestamp_rfc3339();
        let summary = StoredSummary {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            record,
            created_at: now.clone(),
            updated_at: now,
        };

        let response = self
            .request(Method::POST, &format!("users/{user_id}/summaries"))
            .json(&summary)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus { status, body };
            tracing::error!(user = user_id, error = %error, "Failed to insert summary");
            return Err(error);
        }

        let stored: StoredSummary = response.json().await?;
        tracing::debug!(user = user_id, summary = %stored.id, "Summary persisted");
        Ok(stored)
    }

    /// List all summaries owned by the given user.
    pub async fn list_summaries(&self, user_id: &str) -> Result<Vec<StoredSummary>, StoreError> {
        let response = self
            .request(Method::GET, &format!("users/{user_id}/summaries"))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus { status, body };
            tracing::error!(user = user_id, error = %error, "Failed to list summaries");
            return Err(error);
        }

        let payload: ListSummariesResponse = response.json().await?;
        Ok(payload.summaries)
    }

    /// Delete one of the user's summaries by id.
    pub async fn delete_summary(&self, user_id: &str, summary_id: &str) -> Result<(), StoreError> {
        let response = self
            .request(
                Method::DELETE,
                &format!("users/{user_id}/summaries/{summary_id}"),
            )
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                tracing::debug!(user = user_id, summary = summary_id, "Summary deleted");
                Ok(())
            }
            StatusCode::NOT_FOUND => Err(StoreError::NotFound),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = StoreError::UnexpectedStatus { status, body };
                tracing::error!(user = user_id, summary = summary_id, error = %error, "Failed to delete summary");
                Err(error)
            }
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("api-key", api_key);
        }
        req
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

/// Current timestamp formatted for summary records.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
