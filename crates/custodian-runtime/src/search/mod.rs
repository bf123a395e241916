//! Web search abstractions for evidence retrieval.
//!
//! A search provider turns a query into a finite, fully materialized list of
//! [`SearchHit`]s. Providers are shared read-only across concurrent requests.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use custodian_core::SearchHit;

#[cfg(feature = "duckduckgo")]
mod duckduckgo;

#[cfg(feature = "duckduckgo")]
pub use duckduckgo::{parse_results, DuckDuckGoSearch, DEFAULT_DUCKDUCKGO_URL};

/// Errors from search providers.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Search endpoint returned status {0}")]
    Status(u16),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Search provider not configured: {0}")]
    NotConfigured(String),
}

/// Text search over the web.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search for `query`, returning at most `max_results` hits in
    /// provider rank order.
    async fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError>;

    /// Get provider name for logs.
    fn name(&self) -> &str;
}
