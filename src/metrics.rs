use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_summarized: AtomicU64,
    fragment_calls: AtomicU64,
    parse_fallbacks: AtomicU64,
    structure_fallbacks: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a summarized document and the number of fragment completions issued for it.
    pub fn record_document(&self, fragment_calls: u64) {
        self.documents_summarized.fetch_add(1, Ordering::Relaxed);
        self.fragment_calls
            .fetch_add(fragment_calls, Ordering::Relaxed);
    }

    /// Record a summary response that fell back to heuristic extraction.
    pub fn record_parse_fallback(&self) {
        self.parse_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a structure analysis that returned the default record.
    pub fn record_structure_fallback(&self) {
        self.structure_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_summarized: self.documents_summarized.load(Ordering::Relaxed),
            fragment_calls: self.fragment_calls.load(Ordering::Relaxed),
            parse_fallbacks: self.parse_fallbacks.load(Ordering::Relaxed),
            structure_fallbacks: self.structure_fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of summarization counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents summarized since startup.
    pub documents_summarized: u64,
    /// Total per-fragment completion calls issued across all documents.
    pub fragment_calls: u64,
    /// Number of summary responses that required the heuristic fallback.
    pub parse_fallbacks: u64,
    /// Number of structure analyses that returned the default record.
    pub structure_fallbacks: u64,
}
