//! Core data types and error definitions for the summarization pipeline.

use crate::{
    extract::ExtractionError, files::FetchError, llm::CompletionError, store::StoreError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors emitted by the document summarization pipeline.
///
/// Every variant aborts the request. Parse fallbacks are deliberately absent here: a
/// completion response that fails to parse is absorbed into a degraded-but-valid summary
/// and never surfaces as an error.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Uploaded file could not be downloaded from storage.
    #[error("Failed to download document: {0}")]
    Fetch(#[from] FetchError),
    /// Document payload could not be parsed into text.
    #[error("Failed to extract document text: {0}")]
    Extraction(#[from] ExtractionError),
    /// Document parsed successfully but contained no usable text.
    #[error("Document contains no extractable text")]
    EmptyDocument,
    /// Completion request for the summary failed outright.
    #[error("Failed to generate summary: {0}")]
    Generation(#[from] CompletionError),
    /// Summary store rejected the read or write.
    #[error("Summary store request failed: {0}")]
    Store(#[from] StoreError),
}

/// Parameters supplied to build a summary for one uploaded document.
#[derive(Debug, Clone)]
pub struct SummarizeRequest {
    /// URL of the already-uploaded file within the storage service.
    pub file_url: String,
    /// Original file name, used for the summary title and format detection.
    pub file_name: String,
}

/// Coarse classification of a study document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Academic paper with formal structure.
    ResearchPaper,
    /// Standalone prose article.
    Article,
    /// Structured report.
    Report,
    /// Anything else.
    #[default]
    Other,
}

impl DocumentType {
    /// Map a free-form model label onto the closest known type.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.to_lowercase();
        if normalized.contains("research") || normalized.contains("paper") {
            Self::ResearchPaper
        } else if normalized.contains("article") {
            Self::Article
        } else if normalized.contains("report") {
            Self::Report
        } else {
            Self::Other
        }
    }
}

/// Summary content produced by the pipeline for one document, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    /// Title derived from the source file name.
    pub title: String,
    /// Narrative summary text. Never empty when the pipeline reports success.
    pub content: String,
    /// Ordered key points, at most seven (soft cap enforced by the prompt).
    pub key_points: Vec<String>,
    /// Main topic label for the document.
    pub main_topic: String,
    /// Estimated word count of the original document.
    pub word_count: u64,
    /// Original file name.
    pub file_name: String,
    /// Storage URL of the source file.
    pub file_url: String,
    /// Estimated document classification.
    pub document_type: DocumentType,
    /// Whether the document appears to contain an abstract.
    pub has_abstract: bool,
    /// Whether the document appears to contain a conclusion.
    pub has_conclusion: bool,
    /// Estimated page count of the original document.
    pub estimated_pages: u64,
}

/// Derive a human-readable summary title from the uploaded file name.
pub fn title_from_file_name(file_name: &str) -> String {
    let trimmed = file_name.trim();
    let stem = trimmed
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(trimmed);
    if stem.is_empty() {
        "Untitled document".to_string()
    } else {
        stem.to_string()
    }
}
