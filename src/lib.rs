#![deny(missing_docs)]

//! Core library for the StudySum summarization service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Text extraction from uploaded document payloads.
pub mod extract;
/// Retrieval of uploaded files from the storage service.
pub mod files;
/// Completion client abstraction and provider adapters.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Summarization metrics helpers.
pub mod metrics;
/// Document summarization pipeline.
pub mod pipeline;
/// Summary store integration.
pub mod store;
