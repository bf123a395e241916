//! Verdict synthesizer: one LLM call over claim and evidence, parsed into a
//! [`VerdictRecord`].
//!
//! Unlike the earlier stages this one does not absorb its failures. A
//! provider error, timeout or unparseable reply is returned as a
//! [`SynthesisFailure`] and ends the request with an error record.

use std::sync::Arc;
use thiserror::Error;

use custodian_core::{
    parse_verdict_reply, Claim, Decider, EvidenceBundle, VerdictParseError, VerdictRecord,
};

use crate::prompts::verification_prompt;
use crate::providers::{generate_with_timeout, CompletionConfig, LlmProvider, ProviderError};
use crate::usage::LlmUsage;

/// Why a verdict could not be produced.
#[derive(Error, Debug)]
pub enum SynthesisFailure {
    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("{0}")]
    Parse(#[from] VerdictParseError),
}

impl SynthesisFailure {
    /// The error record returned to the caller for this failure.
    pub fn into_record(self) -> VerdictRecord {
        VerdictRecord::error(self.to_string())
    }
}

pub struct VerdictSynthesizer {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
}

impl VerdictSynthesizer {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
        }
    }

    /// Ask the LLM for a verdict on `claim` given `evidence`.
    ///
    /// Called once per request; there is no retry.
    pub async fn synthesize(
        &self,
        claim: &Claim,
        evidence: &EvidenceBundle,
        usage: &mut LlmUsage,
    ) -> Result<VerdictRecord, SynthesisFailure> {
        let prompt = verification_prompt(claim, &evidence.text());

        let response =
            generate_with_timeout(self.provider.as_ref(), &prompt, &self.completion).await?;
        usage.add(&response.usage, &response.model);

        let reply = parse_verdict_reply(&response.content)?;
        let record = reply.into_record(Decider::GeminiAgent);

        tracing::debug!(
            stage = "synthesizer",
            verdict = %record.verdict,
            confidence = record.confidence,
            "Verdict parsed"
        );

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;
    use custodian_core::{SearchHit, Verdict, NO_EVIDENCE_SENTINEL, SEARCH_UNAVAILABLE_SENTINEL};
    use std::time::Duration;

    fn synthesizer(llm: Arc<ScriptedLlm>) -> VerdictSynthesizer {
        VerdictSynthesizer::new(
            llm,
            CompletionConfig {
                timeout: Duration::from_secs(10),
                ..Default::default()
            },
        )
    }

    fn claim() -> Claim {
        Claim::new("The central bank raised interest rates by fifty basis points yesterday")
    }

    #[tokio::test]
    async fn test_fenced_json_reply() {
        let llm = Arc::new(ScriptedLlm::sequence(vec![Ok(
            "```json\n{\"verdict\":\"likely_false\",\"confidence\":0.7,\"explanation\":\"Contradicted.\"}\n```"
                .to_string(),
        )]));
        let mut usage = LlmUsage::default();

        let record = synthesizer(llm)
            .synthesize(&claim(), &EvidenceBundle::Empty, &mut usage)
            .await
            .unwrap();

        assert_eq!(record.verdict, Verdict::LikelyFalse);
        assert_eq!(record.confidence, 0.7);
        assert_eq!(record.decider, Decider::GeminiAgent);
        assert_eq!(record.explanation.as_deref(), Some("Contradicted."));
        assert_eq!(usage.llm_calls, 1);
    }

    #[tokio::test]
    async fn test_partial_reply_uses_defaults() {
        let llm = Arc::new(ScriptedLlm::sequence(vec![Ok("{}".to_string())]));
        let mut usage = LlmUsage::default();

        let record = synthesizer(llm)
            .synthesize(&claim(), &EvidenceBundle::Empty, &mut usage)
            .await
            .unwrap();

        assert_eq!(record.verdict, Verdict::Uncertain);
        assert_eq!(record.confidence, 0.5);
        assert!(record.explanation.is_none());
    }

    #[tokio::test]
    async fn test_prompt_carries_evidence_and_claim() {
        let llm = Arc::new(ScriptedLlm::sequence(vec![Ok("{}".to_string())]));
        let evidence = EvidenceBundle::from_hits(
            vec![SearchHit::new().with_body("Rates up 50bp").with_href("https://a.example")],
            5,
        );
        let mut usage = LlmUsage::default();

        synthesizer(llm.clone())
            .synthesize(&claim(), &evidence, &mut usage)
            .await
            .unwrap();

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("Source 1: Rates up 50bp (Link: https://a.example)"));
        assert!(prompt.contains(claim().as_str()));
    }

    #[tokio::test]
    async fn test_sentinel_evidence_reaches_prompt() {
        for (bundle, sentinel) in [
            (EvidenceBundle::Empty, NO_EVIDENCE_SENTINEL),
            (EvidenceBundle::unavailable("down"), SEARCH_UNAVAILABLE_SENTINEL),
        ] {
            let llm = Arc::new(ScriptedLlm::sequence(vec![Ok("{}".to_string())]));
            let mut usage = LlmUsage::default();

            synthesizer(llm.clone())
                .synthesize(&claim(), &bundle, &mut usage)
                .await
                .unwrap();

            assert!(llm.prompts()[0].contains(&format!("LIVE EVIDENCE:\n{}", sentinel)));
        }
    }

    #[tokio::test]
    async fn test_non_json_reply_fails() {
        let llm = Arc::new(ScriptedLlm::sequence(vec![Ok(
            "I think this is probably true.".to_string(),
        )]));
        let mut usage = LlmUsage::default();

        let failure = synthesizer(llm)
            .synthesize(&claim(), &EvidenceBundle::Empty, &mut usage)
            .await
            .unwrap_err();

        assert!(matches!(failure, SynthesisFailure::Parse(_)));
        let record = failure.into_record();
        assert_eq!(record.verdict, Verdict::Error);
        assert_eq!(record.confidence, 0.0);
        assert!(record.decider.label().starts_with("Error: reply is not valid JSON"));
        // The call itself succeeded, so its tokens are counted
        assert_eq!(usage.llm_calls, 1);
    }

    #[tokio::test]
    async fn test_provider_error_fails() {
        let llm = Arc::new(ScriptedLlm::sequence(vec![Err(ProviderError::ApiError {
            status: 503,
            message: "overloaded".to_string(),
        })]));
        let mut usage = LlmUsage::default();

        let record = synthesizer(llm)
            .synthesize(&claim(), &EvidenceBundle::Empty, &mut usage)
            .await
            .unwrap_err()
            .into_record();

        assert_eq!(
            record.decider,
            Decider::Error("API error: 503 - overloaded".to_string())
        );
        assert_eq!(usage.llm_calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails() {
        let llm = Arc::new(
            ScriptedLlm::sequence(vec![Ok("{}".to_string())]).with_delay(Duration::from_secs(120)),
        );
        let mut usage = LlmUsage::default();

        let failure = synthesizer(llm)
            .synthesize(&claim(), &EvidenceBundle::Empty, &mut usage)
            .await
            .unwrap_err();

        assert!(matches!(
            failure,
            SynthesisFailure::Provider(ProviderError::Timeout(_))
        ));
        assert_eq!(failure.to_string(), "Timeout after 10s");
    }
}
