//! Evidence retriever: one bounded search, normalized into an evidence bundle.

use std::sync::Arc;
use std::time::Duration;

use custodian_core::{EvidenceBundle, SearchTerm, MAX_EVIDENCE_ITEMS};

use crate::search::SearchProvider;

/// Fetches search results for a term and folds them into an [`EvidenceBundle`].
///
/// Failures are absorbed: a provider error or timeout becomes
/// [`EvidenceBundle::Unavailable`], zero results become
/// [`EvidenceBundle::Empty`].
pub struct EvidenceRetriever {
    provider: Arc<dyn SearchProvider>,
    max_results: usize,
    timeout: Duration,
}

impl EvidenceRetriever {
    /// `max_results` is capped at [`MAX_EVIDENCE_ITEMS`].
    pub fn new(provider: Arc<dyn SearchProvider>, max_results: usize, timeout: Duration) -> Self {
        Self {
            provider,
            max_results: max_results.clamp(1, MAX_EVIDENCE_ITEMS),
            timeout,
        }
    }

    pub async fn retrieve(&self, term: &SearchTerm) -> EvidenceBundle {
        let search = self.provider.text(term.as_str(), self.max_results);

        match tokio::time::timeout(self.timeout, search).await {
            Ok(Ok(hits)) => {
                let bundle = EvidenceBundle::from_hits(hits, self.max_results);
                tracing::debug!(
                    stage = "retriever",
                    provider = self.provider.name(),
                    items = bundle.items().len(),
                    "Evidence retrieved"
                );
                bundle
            }
            Ok(Err(e)) => {
                tracing::warn!(stage = "retriever", provider = self.provider.name(), error = %e, "Search failed");
                EvidenceBundle::unavailable(e.to_string())
            }
            Err(_) => {
                tracing::warn!(stage = "retriever", timeout = ?self.timeout, "Search timed out");
                EvidenceBundle::unavailable(format!("Timeout after {:?}", self.timeout))
            }
        }
    }
}
