//! Document summarization pipeline: extraction, chunking, generation, and persistence.

pub mod chunking;
pub mod generator;
mod service;
pub mod structure;
pub mod types;

pub use service::{SummaryApi, SummaryService};
pub use types::{DocumentType, PipelineError, SummarizeRequest, SummaryRecord};
