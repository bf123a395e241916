//! Guardrail Router
//!
//! **Question**: Is this input a falsifiable assertion worth paying for?
//!
//! Interrogative or short input is answered immediately with a fixed,
//! below-threshold confidence. The check is a pure function over the claim
//! text: no I/O, no failure mode.

use serde::{Deserialize, Serialize};

use crate::types::{Claim, Decider, Verdict, VerdictRecord};

/// Confidence reported for every guardrail short-circuit.
pub const GUARDRAIL_CONFIDENCE: f64 = 0.45;

/// Claims with fewer tokens than this are rejected.
pub const MIN_CLAIM_TOKENS: usize = 10;

/// Thresholds applied by the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardrailPolicy {
    /// Minimum whitespace-delimited token count
    pub min_tokens: usize,

    /// Reject any claim containing a question mark
    pub reject_questions: bool,
}

impl Default for GuardrailPolicy {
    fn default() -> Self {
        Self {
            min_tokens: MIN_CLAIM_TOKENS,
            reject_questions: true,
        }
    }
}

/// Why a claim was short-circuited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum GuardrailReason {
    /// The claim contains a question mark
    Interrogative,

    /// The claim has too few tokens
    TooShort { tokens: usize, min_tokens: usize },
}

/// Outcome of routing a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardrailDecision {
    Pass,
    Reject(GuardrailReason),
}

impl GuardrailDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, GuardrailDecision::Pass)
    }

    /// The record to return for a rejected claim.
    pub fn record(&self) -> Option<VerdictRecord> {
        match self {
            GuardrailDecision::Pass => None,
            GuardrailDecision::Reject(_) => Some(short_circuit_record()),
        }
    }
}

impl GuardrailPolicy {
    /// Route a claim.
    pub fn route(&self, claim: &Claim) -> GuardrailDecision {
        if self.reject_questions && claim.as_str().contains('?') {
            return GuardrailDecision::Reject(GuardrailReason::Interrogative);
        }

        let tokens = claim.token_count();
        if tokens < self.min_tokens {
            return GuardrailDecision::Reject(GuardrailReason::TooShort {
                tokens,
                min_tokens: self.min_tokens,
            });
        }

        GuardrailDecision::Pass
    }
}

/// Route a claim with the default policy.
pub fn route(claim: &Claim) -> GuardrailDecision {
    GuardrailPolicy::default().route(claim)
}

fn short_circuit_record() -> VerdictRecord {
    VerdictRecord {
        verdict: Verdict::Uncertain,
        confidence: GUARDRAIL_CONFIDENCE,
        decider: Decider::GuardrailRouting,
        explanation: None,
    }
}
