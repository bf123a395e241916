//! Core types for claim verification.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;

/// Decider label for answers produced by the guardrail.
pub const GUARDRAIL_DECIDER: &str = "Guardrail-Routing";

/// Decider label for answers produced by the LLM agent.
pub const AGENT_DECIDER: &str = "Gemini-Agent";

const ERROR_DECIDER_PREFIX: &str = "Error: ";

/// A user-supplied assertion to be fact-checked.
///
/// Claims are immutable once constructed. No length limit is enforced here;
/// downstream providers impose their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claim(String);

impl Claim {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of whitespace-delimited tokens.
    pub fn token_count(&self) -> usize {
        self.0.split_whitespace().count()
    }

    /// Trimmed, lowercased text with whitespace runs collapsed.
    pub fn normalized(&self) -> String {
        normalize_claim(&self.0)
    }

    /// Stable identifier for log correlation.
    ///
    /// Two claims that normalize to the same text share a fingerprint, so
    /// the raw claim never has to be written to logs. The value is the first
    /// 8 bytes of the SHA-256 digest of the normalized text, as 16 lowercase
    /// hex chars.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.normalized().as_bytes());
        hasher.finalize()[..8]
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Claim {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Claim {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Claim {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Normalize claim text: trim, lowercase, collapse whitespace.
pub fn normalize_claim(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A short search-engine query derived from a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Use the claim text verbatim as the query.
    pub fn from_claim(claim: &Claim) -> Self {
        Self(claim.as_str().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final verdict on a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    LikelyTrue,
    LikelyFalse,
    Uncertain,
    Error,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::LikelyTrue => "likely_true",
            Verdict::LikelyFalse => "likely_false",
            Verdict::Uncertain => "uncertain",
            Verdict::Error => "error",
        }
    }

    /// Parse a wire label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "likely_true" => Some(Verdict::LikelyTrue),
            "likely_false" => Some(Verdict::LikelyFalse),
            "uncertain" => Some(Verdict::Uncertain),
            "error" => Some(Verdict::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a decider label.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Unknown decider label: {0}")]
pub struct DeciderParseError(pub String);

/// Which component produced the final answer.
///
/// Serialized as its label: `Guardrail-Routing`, `Gemini-Agent`, or
/// `Error: <message>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Decider {
    GuardrailRouting,
    GeminiAgent,
    Error(String),
}

impl Decider {
    pub fn label(&self) -> String {
        match self {
            Decider::GuardrailRouting => GUARDRAIL_DECIDER.to_string(),
            Decider::GeminiAgent => AGENT_DECIDER.to_string(),
            Decider::Error(message) => format!("{}{}", ERROR_DECIDER_PREFIX, message),
        }
    }
}

impl fmt::Display for Decider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<Decider> for String {
    fn from(decider: Decider) -> Self {
        decider.label()
    }
}

impl TryFrom<String> for Decider {
    type Error = DeciderParseError;

    fn try_from(label: String) -> Result<Self, DeciderParseError> {
        match label.as_str() {
            GUARDRAIL_DECIDER => Ok(Decider::GuardrailRouting),
            AGENT_DECIDER => Ok(Decider::GeminiAgent),
            other => other
                .strip_prefix(ERROR_DECIDER_PREFIX)
                .map(|message| Decider::Error(message.to_string()))
                .ok_or(DeciderParseError(label)),
        }
    }
}

/// The only output type crossing the system boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerdictRecord {
    pub verdict: Verdict,

    /// In [0, 1]; always 0.0 for error records.
    pub confidence: f64,

    pub decider: Decider,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl VerdictRecord {
    /// An error record. Confidence is 0.0 by convention.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Error,
            confidence: 0.0,
            decider: Decider::Error(message.into()),
            explanation: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.verdict == Verdict::Error
    }
}
