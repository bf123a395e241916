//! Pipeline orchestrator for claim verification.
//!
//! The orchestrator runs one strictly linear pipeline per request:
//! - Pre-flight: no LLM provider means an immediate error record
//! - Guardrail: short or interrogative claims exit early
//! - Optimize → Retrieve → Synthesize, each exactly once
//!
//! Optimizer and retriever failures are absorbed as fallback values. Only a
//! synthesis failure ends in an error record, and even that is an ordinary
//! [`VerdictRecord`], never an `Err`. Every request yields exactly one record.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::Instrument;

use custodian_core::{Claim, EvidenceBundle, GuardrailDecision, GuardrailPolicy, VerdictRecord};

use crate::config::{ConfigError, RuntimeConfig};
use crate::optimizer::{QueryOptimization, QueryOptimizer};
use crate::providers::LlmProvider;
use crate::retriever::EvidenceRetriever;
use crate::search::SearchProvider;
use crate::synthesizer::VerdictSynthesizer;
use crate::usage::LlmUsage;

/// Decider message for requests that arrive with no LLM provider.
pub const UNCONFIGURED_MESSAGE: &str = "LLM provider not configured";

/// Errors building a pipeline.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Search provider not configured: {0}")]
    SearchNotConfigured(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// States visited by one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Start,
    GuardrailReject,
    Optimizing,
    Retrieving,
    Synthesizing,
    Done,
}

/// What happened during one verification.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineTrace {
    /// Fingerprint of the normalized claim
    pub claim_id: String,

    pub states: Vec<PipelineState>,

    /// Absent when the pre-flight check ended the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardrail: Option<GuardrailDecision>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<QueryOptimization>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceBundle>,

    pub usage: LlmUsage,

    pub started_at: DateTime<Utc>,

    pub elapsed_ms: u64,
}

impl PipelineTrace {
    fn new(claim: &Claim) -> Self {
        Self {
            claim_id: claim.fingerprint(),
            states: vec![PipelineState::Start],
            guardrail: None,
            optimization: None,
            evidence: None,
            usage: LlmUsage::default(),
            started_at: Utc::now(),
            elapsed_ms: 0,
        }
    }

    fn enter(&mut self, state: PipelineState) {
        tracing::debug!(state = ?state, "Pipeline transition");
        self.states.push(state);
    }
}

/// Final record plus the trace that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub record: VerdictRecord,
    pub trace: PipelineTrace,
}

/// The LLM-backed stages, present only when a provider is configured.
struct AgentStages {
    optimizer: QueryOptimizer,
    synthesizer: VerdictSynthesizer,
}

/// Runs the verification pipeline.
///
/// Holds shared read-only provider handles; `verify` may be called
/// concurrently from many tasks without interference.
pub struct VerificationPipeline {
    agent: Option<AgentStages>,
    retriever: EvidenceRetriever,
    guardrail: GuardrailPolicy,
}

impl VerificationPipeline {
    pub fn builder() -> VerificationPipelineBuilder {
        VerificationPipelineBuilder::new()
    }

    /// Whether an LLM provider is configured.
    pub fn has_llm(&self) -> bool {
        self.agent.is_some()
    }

    /// Verify a claim, returning exactly one record.
    pub async fn verify(&self, claim: impl Into<Claim>) -> VerdictRecord {
        self.verify_traced(claim).await.record
    }

    /// Verify a claim, returning the record and its trace.
    pub async fn verify_traced(&self, claim: impl Into<Claim>) -> PipelineOutcome {
        let claim = claim.into();
        let clock = Instant::now();
        let mut trace = PipelineTrace::new(&claim);

        let span = tracing::info_span!("verify", claim_id = %trace.claim_id);
        let record = self.run(&claim, &mut trace).instrument(span.clone()).await;

        trace.enter(PipelineState::Done);
        trace.elapsed_ms = clock.elapsed().as_millis() as u64;

        span.in_scope(|| {
            tracing::info!(
                verdict = %record.verdict,
                confidence = record.confidence,
                decider = %record.decider,
                llm_calls = trace.usage.llm_calls,
                elapsed_ms = trace.elapsed_ms,
                "Verification complete"
            );
        });

        PipelineOutcome { record, trace }
    }

    /// Verify several claims concurrently, preserving input order.
    pub async fn verify_batch<I, C>(&self, claims: I) -> Vec<PipelineOutcome>
    where
        I: IntoIterator<Item = C>,
        C: Into<Claim>,
    {
        futures::future::join_all(claims.into_iter().map(|claim| self.verify_traced(claim))).await
    }

    async fn run(&self, claim: &Claim, trace: &mut PipelineTrace) -> VerdictRecord {
        // Pre-flight
        let Some(agent) = &self.agent else {
            tracing::warn!("No LLM provider configured, returning error record");
            return VerdictRecord::error(UNCONFIGURED_MESSAGE);
        };

        let decision = self.guardrail.route(claim);
        let short_circuit = decision.record();
        trace.guardrail = Some(decision);
        if let Some(record) = short_circuit {
            trace.enter(PipelineState::GuardrailReject);
            return record;
        }

        trace.enter(PipelineState::Optimizing);
        let optimization = agent.optimizer.optimize(claim, &mut trace.usage).await;

        trace.enter(PipelineState::Retrieving);
        let evidence = self.retriever.retrieve(optimization.term()).await;
        trace.optimization = Some(optimization);

        trace.enter(PipelineState::Synthesizing);
        let result = agent
            .synthesizer
            .synthesize(claim, &evidence, &mut trace.usage)
            .await;
        trace.evidence = Some(evidence);

        match result {
            Ok(record) => record,
            Err(failure) => {
                tracing::warn!(stage = "synthesizer", error = %failure, "Verdict synthesis failed");
                failure.into_record()
            }
        }
    }
}

/// Builder for [`VerificationPipeline`].
pub struct VerificationPipelineBuilder {
    llm: Option<Arc<dyn LlmProvider>>,
    search: Option<Arc<dyn SearchProvider>>,
    config: RuntimeConfig,
}

impl VerificationPipelineBuilder {
    pub fn new() -> Self {
        Self {
            llm: None,
            search: None,
            config: RuntimeConfig::default(),
        }
    }

    /// Set the LLM provider.
    pub fn llm(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(provider);
        self
    }

    /// Set the LLM provider if one is available.
    ///
    /// A pipeline without one answers every request with an error record.
    pub fn maybe_llm(mut self, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        self.llm = provider;
        self
    }

    /// Set the search provider.
    pub fn search(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the pipeline.
    pub fn build(self) -> Result<VerificationPipeline, RuntimeError> {
        self.config.validate()?;

        let search = self
            .search
            .ok_or_else(|| RuntimeError::SearchNotConfigured("No search provider set".to_string()))?;

        let config = self.config;
        let agent = self.llm.map(|provider| AgentStages {
            optimizer: QueryOptimizer::new(
                provider.clone(),
                config.completion_config(config.timeouts.optimizer),
            ),
            synthesizer: VerdictSynthesizer::new(
                provider,
                config.completion_config(config.timeouts.synthesis),
            ),
        });

        Ok(VerificationPipeline {
            agent,
            retriever: EvidenceRetriever::new(search, config.max_results, config.timeouts.search),
            guardrail: config.guardrail,
        })
    }
}

impl Default for VerificationPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
