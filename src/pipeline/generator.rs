//! Summary generation: prompts, structured-output parsing, and the heuristic fallback.
//!
//! Long documents are reduced to fragment summaries first (one completion per chunk, up
//! to a configurable cap), then a single structured-output call produces the final
//! summary. The model is asked for JSON; when the response does not parse, the raw prose
//! becomes the summary and the remaining fields are derived deterministically. That
//! degraded path is a valid outcome, not an error, and callers must handle both variants
//! explicitly.

use crate::llm::{CompletionClient, CompletionError};
use crate::pipeline::chunking::{ChunkSettings, chunk_text};
use serde::Deserialize;

/// Character budget for the input of the final structured-output call.
///
/// Deliberately lossy: summaries of very long documents are summaries of a prefix or of
/// the aggregated fragment summaries, never of the full text.
pub const FINAL_INPUT_BUDGET: usize = 3000;

/// Topic label assigned when the structured response could not be parsed.
pub const FALLBACK_TOPIC: &str = "Document Analysis";

const FALLBACK_KEY_POINT_CAP: usize = 5;
const MIN_KEY_POINT_CHARS: usize = 10;

/// Structured summary fields requested from the model.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredSummary {
    /// Narrative summary, two to three paragraphs.
    pub summary: String,
    /// Key points in extraction order.
    #[serde(default)]
    pub key_points: Vec<String>,
    /// Main topic label.
    #[serde(default)]
    pub main_topic: String,
    /// Estimated word count of the original document.
    #[serde(default)]
    pub word_count: u64,
}

/// Outcome of interpreting the final completion response.
///
/// Both variants carry usable summary fields; the variant records how they were obtained
/// so the orchestrator can count fallbacks without changing the response shape.
#[derive(Debug, Clone)]
pub enum SummaryOutcome {
    /// Model returned the requested JSON shape.
    Structured(StructuredSummary),
    /// Model returned free-form prose; fields were derived heuristically.
    Degraded(StructuredSummary),
}

impl SummaryOutcome {
    /// Unwrap the summary fields regardless of how they were produced.
    pub fn into_summary(self) -> StructuredSummary {
        match self {
            Self::Structured(summary) | Self::Degraded(summary) => summary,
        }
    }
}

/// Result of running the generation stage for one document.
#[derive(Debug)]
pub struct GenerationOutput {
    /// Interpreted final response.
    pub outcome: SummaryOutcome,
    /// Number of per-fragment completion calls that were issued.
    pub fragment_calls: usize,
}

/// Generate a summary for extracted document text.
///
/// Text above the chunking threshold is split and the first `max_chunks` chunks are
/// summarized one completion at a time, in order; shorter text goes straight to the final
/// call. A transport-level completion failure or a blank final response aborts with the
/// underlying error and no retry. Retry policy belongs to the caller.
pub async fn generate_summary(
    client: &dyn CompletionClient,
    text: &str,
    settings: &ChunkSettings,
) -> Result<GenerationOutput, CompletionError> {
    let char_count = text.chars().count();
    let mut fragment_calls = 0;

    let source = if char_count > settings.threshold {
        let mut fragment_summaries = Vec::with_capacity(settings.max_chunks);
        for chunk in chunk_text(text, settings.chunk_size, settings.overlap).take(settings.max_chunks)
        {
            let summary = client.complete(&fragment_prompt(chunk)).await?;
            fragment_calls += 1;
            fragment_summaries.push(summary);
        }
        tracing::debug!(
            chars = char_count,
            fragments = fragment_calls,
            "Summarized document fragments"
        );
        fragment_summaries.join("\n\n")
    } else {
        text.to_string()
    };

    let prompt = structured_prompt(truncate_chars(&source, FINAL_INPUT_BUDGET));
    let response = client.complete(&prompt).await?;
    // Blank responses never reach the fallback; the summary body must not be empty.
    if response.trim().is_empty() {
        return Err(CompletionError::InvalidResponse(
            "completion response was empty".into(),
        ));
    }

    Ok(GenerationOutput {
        outcome: interpret_response(&response),
        fragment_calls,
    })
}

/// Interpret the final completion response as structured output or fall back.
///
/// A structured response with a blank `mainTopic` keeps its parsed fields but receives
/// the fallback topic label, so a topic is always present.
///
/// The fallback is deterministic and bounded: the raw response becomes the narrative
/// summary, key points are the first five sentences longer than ten characters, the topic
/// is a fixed label, and the word count is the whitespace word count of the response.
pub fn interpret_response(response: &str) -> SummaryOutcome {
    if let Some(mut parsed) = parse_structured(response)
        && !parsed.summary.trim().is_empty()
    {
        if parsed.main_topic.trim().is_empty() {
            parsed.main_topic = FALLBACK_TOPIC.to_string();
        }
        return SummaryOutcome::Structured(parsed);
    }

    let content = response.trim().to_string();
    let key_points = fallback_key_points(&content);
    let word_count = content.split_whitespace().count() as u64;
    SummaryOutcome::Degraded(StructuredSummary {
        summary: content,
        key_points,
        main_topic: FALLBACK_TOPIC.to_string(),
        word_count,
    })
}

/// Attempt to parse the response body as the requested JSON shape.
///
/// Models routinely wrap JSON in code fences or prose, so parsing targets the region
/// between the first `{` and the last `}`.
fn parse_structured(response: &str) -> Option<StructuredSummary> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&response[start..=end]).ok()
}

/// Derive bounded key points from free-form prose.
fn fallback_key_points(content: &str) -> Vec<String> {
    content
        .split(['.', '!', '?'])
        .map(str::trim)
        .filter(|sentence| sentence.chars().count() > MIN_KEY_POINT_CHARS)
        .take(FALLBACK_KEY_POINT_CAP)
        .map(str::to_string)
        .collect()
}

/// Truncate text to at most `budget` characters without splitting a code point.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

fn fragment_prompt(chunk: &str) -> String {
    format!(
        "Summarize this fragment of a study document in two or three sentences. \
         Keep definitions, formulas, and named concepts.\n\n{chunk}"
    )
}

fn structured_prompt(text: &str) -> String {
    format!(
        "You are summarizing a study document for a student. Respond with JSON only, \
         using this exact shape: {{\"summary\": \"a 2-3 paragraph narrative summary\", \
         \"keyPoints\": [\"5 to 7 key points\"], \"mainTopic\": \"the main topic\", \
         \"wordCount\": estimated word count of the original document}}.\n\n\
         Document text:\n{text}"
    )
}
