//! Summary store integration.

pub mod client;
pub mod types;

pub use client::SummaryStore;
pub use types::{StoreError, StoredSummary};
