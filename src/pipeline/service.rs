//! Orchestration of the summarization pipeline.

use crate::{
    config::get_config,
    extract::{detect_kind, extract_text},
    files::FileFetcher,
    llm::{CompletionClient, build_completion_client},
    metrics::{MetricsSnapshot, PipelineMetrics},
    pipeline::{
        chunking::ChunkSettings,
        generator::{SummaryOutcome, generate_summary},
        structure::analyze_structure,
        types::{PipelineError, SummarizeRequest, SummaryRecord, title_from_file_name},
    },
    store::{StoredSummary, SummaryStore},
};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Coordinates the full summarization pipeline: download, extraction, generation,
/// structure analysis, and persistence.
///
/// The service owns long-lived handles to the file fetcher, completion client, summary
/// store, and metrics registry. Construct it once near process start and share it through
/// an `Arc`; every external collaborator is injected here rather than reached through
/// module-level state.
pub struct SummaryService {
    fetcher: FileFetcher,
    completion: Box<dyn CompletionClient + Send + Sync>,
    store: SummaryStore,
    metrics: Arc<PipelineMetrics>,
    chunking: ChunkSettings,
}

/// Abstraction over the summarization pipeline used by the HTTP surface.
#[async_trait]
pub trait SummaryApi: Send + Sync {
    /// Download, summarize, and persist one uploaded document for a user.
    async fn summarize_document(
        &self,
        user_id: &str,
        request: SummarizeRequest,
    ) -> Result<StoredSummary, PipelineError>;

    /// List summaries owned by a user.
    async fn list_summaries(&self, user_id: &str) -> Result<Vec<StoredSummary>, PipelineError>;

    /// Delete one of a user's summaries.
    async fn delete_summary(&self, user_id: &str, summary_id: &str)
    -> Result<(), PipelineError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl SummaryService {
    /// Build a new service from the process configuration.
    pub fn new() -> Self {
        let config = get_config();
        let defaults = ChunkSettings::default();
        let chunking = ChunkSettings {
            chunk_size: config.chunk_size.unwrap_or(defaults.chunk_size).max(1),
            overlap: config.chunk_overlap.unwrap_or(defaults.overlap),
            threshold: config.chunk_threshold.unwrap_or(defaults.threshold),
            max_chunks: config
                .summary_max_chunks
                .unwrap_or(defaults.max_chunks)
                .max(1),
        };
        tracing::debug!(
            chunk_size = chunking.chunk_size,
            overlap = chunking.overlap,
            threshold = chunking.threshold,
            max_chunks = chunking.max_chunks,
            "Resolved chunk settings"
        );

        let fetch_client = Client::builder()
            .user_agent("studysum/0.1")
            .timeout(Duration::from_secs(config.llm_timeout_secs))
            .build()
            .expect("Failed to construct reqwest::Client for file downloads");

        Self {
            fetcher: FileFetcher::new(fetch_client),
            completion: build_completion_client(config),
            store: SummaryStore::new().expect("Failed to initialize summary store client"),
            metrics: Arc::new(PipelineMetrics::new()),
            chunking,
        }
    }

    /// Run the pipeline for one uploaded document.
    ///
    /// Stages run strictly in sequence. Extraction, generation, and persistence failures
    /// abort the request; a structure-analysis failure is absorbed into the default
    /// record and shows up only in metrics.
    pub async fn summarize_document(
        &self,
        user_id: &str,
        request: SummarizeRequest,
    ) -> Result<StoredSummary, PipelineError> {
        tracing::info!(user = user_id, file = %request.file_name, "Summarizing document");

        let bytes = self.fetcher.fetch(&request.file_url).await?;
        let kind = detect_kind(&request.file_name, &bytes);
        let text = extract_text(&bytes, kind)?;
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyDocument);
        }

        let generated = generate_summary(self.completion.as_ref(), &text, &self.chunking).await?;
        let summary = match generated.outcome {
            SummaryOutcome::Structured(summary) => summary,
            SummaryOutcome::Degraded(summary) => {
                self.metrics.record_parse_fallback();
                summary
            }
        };

        let analysis = analyze_structure(self.completion.as_ref(), &text).await;
        if analysis.degraded {
            self.metrics.record_structure_fallback();
        }

        let record = SummaryRecord {
            title: title_from_file_name(&request.file_name),
            content: summary.summary,
            key_points: summary.key_points,
            main_topic: summary.main_topic,
            word_count: summary.word_count,
            file_name: request.file_name,
            file_url: request.file_url,
            document_type: analysis.structure.document_type,
            has_abstract: analysis.structure.has_abstract,
            has_conclusion: analysis.structure.has_conclusion,
            estimated_pages: analysis.structure.estimated_pages,
        };

        let stored = self.store.insert_summary(user_id, record).await?;
        self.metrics.record_document(generated.fragment_calls as u64);
        tracing::info!(
            user = user_id,
            summary = %stored.id,
            fragments = generated.fragment_calls,
            word_count = stored.record.word_count,
            "Document summarized"
        );

        Ok(stored)
    }

    /// Enumerate the user's stored summaries.
    pub async fn list_summaries(
        &self,
        user_id: &str,
    ) -> Result<Vec<StoredSummary>, PipelineError> {
        self.store
            .list_summaries(user_id)
            .await
            .map_err(PipelineError::from)
    }

    /// Delete one of the user's summaries by id.
    pub async fn delete_summary(
        &self,
        user_id: &str,
        summary_id: &str,
    ) -> Result<(), PipelineError> {
        self.store
            .delete_summary(user_id, summary_id)
            .await
            .map_err(PipelineError::from)
    }

    /// Return the current summarization metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl SummaryApi for SummaryService {
    async fn summarize_document(
        &self,
        user_id: &str,
        request: SummarizeRequest,
    ) -> Result<StoredSummary, PipelineError> {
        SummaryService::summarize_document(self, user_id, request).await
    }

    async fn list_summaries(&self, user_id: &str) -> Result<Vec<StoredSummary>, PipelineError> {
        SummaryService::list_summaries(self, user_id).await
    }

    async fn delete_summary(
        &self,
        user_id: &str,
        summary_id: &str,
    ) -> Result<(), PipelineError> {
        SummaryService::delete_summary(self, user_id, summary_id).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        SummaryService::metrics_snapshot(self)
    }
}
