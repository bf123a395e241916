//! # custodian-runtime
//!
//! Agentic claim verification for Custodian.
//!
//! This crate runs the network-bound half of verification: it rewrites a
//! claim into a search query with an LLM, fetches live web evidence, and
//! asks the LLM for a structured verdict on that evidence.
//!
//! ## Important
//!
//! Every decision that needs no network call lives in `custodian-core`.
//! This crate only sequences providers around it and maps each provider
//! failure onto a well-defined [`VerdictRecord`](custodian_core::VerdictRecord).
//!
//! Concrete providers sit behind cargo features:
//! - `gemini`: Gemini `generateContent` over HTTPS
//! - `duckduckgo`: DuckDuckGo HTML search
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use custodian_runtime::{DuckDuckGoSearch, GeminiProvider, RuntimeConfig, VerificationPipeline};
//!
//! let config = RuntimeConfig::default();
//! let pipeline = VerificationPipeline::builder()
//!     .maybe_llm(GeminiProvider::from_env().ok().map(|p| Arc::new(p) as _))
//!     .search(Arc::new(DuckDuckGoSearch::from_settings(&config.search, config.timeouts.search)?))
//!     .config(config)
//!     .build()?;
//!
//! let record = pipeline
//!     .verify("The central bank raised interest rates by fifty basis points yesterday")
//!     .await;
//! ```

pub mod config;
pub mod optimizer;
pub mod orchestrator;
pub mod prompts;
pub mod providers;
pub mod retriever;
pub mod search;
pub mod synthesizer;
pub mod usage;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{ConfigError, LlmSettings, RuntimeConfig, SearchSettings, StageTimeouts};
pub use optimizer::{OptimizerFallback, QueryOptimization, QueryOptimizer};
pub use orchestrator::{
    PipelineOutcome, PipelineState, PipelineTrace, RuntimeError, VerificationPipeline,
    VerificationPipelineBuilder, UNCONFIGURED_MESSAGE,
};
pub use providers::{
    ApiCredential, CompletionConfig, LlmProvider, ProviderError, ProviderFactory,
    ProviderRegistry, TokenUsage,
};
pub use retriever::EvidenceRetriever;
pub use search::{SearchError, SearchProvider};
pub use synthesizer::{SynthesisFailure, VerdictSynthesizer};
pub use usage::LlmUsage;

#[cfg(feature = "gemini")]
pub use providers::GeminiProvider;

#[cfg(feature = "duckduckgo")]
pub use search::DuckDuckGoSearch;
