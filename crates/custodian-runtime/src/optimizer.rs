//! Query optimizer: rewrite a verbose claim into a short search query.
//!
//! This stage never aborts the pipeline. Any provider failure, timeout or
//! blank reply falls back to searching for the raw claim, and the outcome
//! says which branch was taken.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use custodian_core::{Claim, SearchTerm};

use crate::prompts::optimizer_prompt;
use crate::providers::{generate_with_timeout, CompletionConfig, LlmProvider, ProviderError};
use crate::usage::LlmUsage;

/// Why the optimizer fell back to the raw claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum OptimizerFallback {
    ProviderFailed(String),
    TimedOut,
    EmptyResponse,
}

/// Outcome of query optimization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOptimization {
    Optimized {
        term: SearchTerm,
    },
    Fallback {
        term: SearchTerm,
        reason: OptimizerFallback,
    },
}

impl QueryOptimization {
    /// The term to search for, whichever branch produced it.
    pub fn term(&self) -> &SearchTerm {
        match self {
            QueryOptimization::Optimized { term } | QueryOptimization::Fallback { term, .. } => {
                term
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, QueryOptimization::Fallback { .. })
    }
}

/// Turns claims into search terms with one LLM call each.
pub struct QueryOptimizer {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
}

impl QueryOptimizer {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
        }
    }

    /// Optimize `claim` into a search term.
    ///
    /// Token usage of a successful call is added to `usage`.
    pub async fn optimize(&self, claim: &Claim, usage: &mut LlmUsage) -> QueryOptimization {
        let prompt = optimizer_prompt(claim);

        let reason = match generate_with_timeout(self.provider.as_ref(), &prompt, &self.completion)
            .await
        {
            Ok(response) => {
                usage.add(&response.usage, &response.model);
                let query = response.content.trim();
                if !query.is_empty() {
                    tracing::debug!(
                        stage = "optimizer",
                        words = query.split_whitespace().count(),
                        "Query optimized"
                    );
                    return QueryOptimization::Optimized {
                        term: SearchTerm::new(query),
                    };
                }
                tracing::warn!(stage = "optimizer", "Provider returned an empty query");
                OptimizerFallback::EmptyResponse
            }
            Err(ProviderError::Timeout(timeout)) => {
                tracing::warn!(stage = "optimizer", timeout = ?timeout, "Query optimization timed out");
                OptimizerFallback::TimedOut
            }
            Err(e) => {
                tracing::warn!(stage = "optimizer", error = %e, "Query optimization failed");
                OptimizerFallback::ProviderFailed(e.to_string())
            }
        };

        QueryOptimization::Fallback {
            term: SearchTerm::from_claim(claim),
            reason,
        }
    }
}
