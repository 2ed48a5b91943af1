//! Structural analysis of extracted document text.
//!
//! A second, independent completion classifies the document and detects structural
//! markers. Unlike summary generation this stage is non-fatal: any failure, whether the
//! request itself or the response format, collapses into a default record so the caller
//! always receives some structural result.

use crate::llm::CompletionClient;
use crate::pipeline::generator::truncate_chars;
use crate::pipeline::types::DocumentType;
use serde::{Deserialize, Serialize};

/// Character budget for the structure-analysis input.
pub const STRUCTURE_INPUT_BUDGET: usize = 2000;

/// Characters assumed per page when estimating page count without model help.
const CHARS_PER_PAGE: usize = 2000;

/// Structural markers detected for a document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentStructure {
    /// Estimated document classification.
    pub document_type: DocumentType,
    /// Section titles detected in the text.
    pub sections: Vec<String>,
    /// Whether the document appears to contain an abstract.
    pub has_abstract: bool,
    /// Whether the document appears to contain a conclusion.
    pub has_conclusion: bool,
    /// Estimated page count of the original document.
    pub estimated_pages: u64,
}

impl DocumentStructure {
    /// Default record used whenever analysis fails.
    pub fn fallback(text_chars: usize) -> Self {
        Self {
            document_type: DocumentType::Other,
            sections: Vec::new(),
            has_abstract: false,
            has_conclusion: false,
            estimated_pages: text_chars.div_ceil(CHARS_PER_PAGE).max(1) as u64,
        }
    }
}

/// Result of running structure analysis, recording whether the default record was used.
#[derive(Debug)]
pub struct StructureAnalysis {
    /// Structural markers for the document.
    pub structure: DocumentStructure,
    /// True when the default record was substituted for a failed analysis.
    pub degraded: bool,
}

/// Wire shape requested from the model; lenient so partial answers still count.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructureResponse {
    document_type: Option<String>,
    #[serde(default)]
    sections: Vec<String>,
    #[serde(default)]
    has_abstract: bool,
    #[serde(default)]
    has_conclusion: bool,
    estimated_pages: Option<u64>,
}

/// Classify document structure with one independent completion request.
///
/// Never returns an error: request failures and unparseable responses both yield the
/// fallback record.
pub async fn analyze_structure(client: &dyn CompletionClient, text: &str) -> StructureAnalysis {
    let text_chars = text.chars().count();
    let prompt = structure_prompt(truncate_chars(text, STRUCTURE_INPUT_BUDGET));

    let response = match client.complete(&prompt).await {
        Ok(response) => response,
        Err(error) => {
            tracing::warn!(error = %error, "Structure analysis request failed; using default record");
            return StructureAnalysis {
                structure: DocumentStructure::fallback(text_chars),
                degraded: true,
            };
        }
    };

    match parse_structure(&response, text_chars) {
        Some(structure) => StructureAnalysis {
            structure,
            degraded: false,
        },
        None => {
            tracing::debug!("Structure response did not parse; using default record");
            StructureAnalysis {
                structure: DocumentStructure::fallback(text_chars),
                degraded: true,
            }
        }
    }
}

fn parse_structure(response: &str, text_chars: usize) -> Option<DocumentStructure> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    let parsed: StructureResponse = serde_json::from_str(&response[start..=end]).ok()?;
    let fallback_pages = DocumentStructure::fallback(text_chars).estimated_pages;

    Some(DocumentStructure {
        document_type: parsed
            .document_type
            .as_deref()
            .map(DocumentType::from_label)
            .unwrap_or_default(),
        sections: parsed.sections,
        has_abstract: parsed.has_abstract,
        has_conclusion: parsed.has_conclusion,
        estimated_pages: parsed.estimated_pages.unwrap_or(fallback_pages),
    })
}

fn structure_prompt(text: &str) -> String {
    format!(
        "Classify this study document. Respond with JSON only, using this exact shape: \
         {{\"documentType\": \"research_paper | article | report | other\", \
         \"sections\": [\"detected section titles\"], \"hasAbstract\": true or false, \
         \"hasConclusion\": true or false, \"estimatedPages\": estimated page count}}.\n\n\
         Document text:\n{text}"
    )
}
