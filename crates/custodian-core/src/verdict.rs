//! Parsing of the LLM's structured verdict reply.
//!
//! The reply is expected to be a JSON object with `verdict`, `confidence`
//! and `explanation`, possibly wrapped in markdown code fences. A reply that
//! parses to an object always succeeds: missing or malformed keys take their
//! defaults. Only non-JSON text and non-object JSON are errors.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::types::{Decider, Verdict, VerdictRecord};

/// Confidence used when the reply omits it.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"```(?i:json)?").expect("Invalid regex");
}

/// Errors from parsing a verdict reply.
#[derive(Error, Debug)]
pub enum VerdictParseError {
    #[error("reply is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("reply must be a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// A verdict as stated by the LLM, after defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct VerdictReply {
    pub verdict: Verdict,
    pub confidence: f64,
    pub explanation: Option<String>,
}

impl VerdictReply {
    pub fn into_record(self, decider: Decider) -> VerdictRecord {
        VerdictRecord {
            verdict: self.verdict,
            confidence: self.confidence,
            decider,
            explanation: self.explanation,
        }
    }
}

/// Remove every code fence marker and trim.
pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").trim().to_string()
}

/// Parse the LLM's reply into a verdict.
pub fn parse_verdict_reply(text: &str) -> Result<VerdictReply, VerdictParseError> {
    let cleaned = strip_code_fences(text);
    let object = match serde_json::from_str::<Value>(&cleaned)? {
        Value::Object(map) => map,
        other => return Err(VerdictParseError::NotAnObject(json_kind(&other))),
    };

    Ok(VerdictReply {
        verdict: read_verdict(&object),
        confidence: read_confidence(&object),
        explanation: read_explanation(&object),
    })
}

fn read_verdict(object: &Map<String, Value>) -> Verdict {
    match object.get("verdict") {
        None | Some(Value::Null) => Verdict::Uncertain,
        Some(Value::String(label)) => match Verdict::from_label(label) {
            Some(Verdict::Error) | None => {
                tracing::warn!(label = %label, "Unrecognized verdict label, using uncertain");
                Verdict::Uncertain
            }
            Some(verdict) => verdict,
        },
        Some(other) => {
            tracing::warn!(kind = json_kind(other), "Non-string verdict, using uncertain");
            Verdict::Uncertain
        }
    }
}

fn read_confidence(object: &Map<String, Value>) -> f64 {
    let raw = match object.get("confidence") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(value) if value.is_finite() => value.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    }
}

fn read_explanation(object: &Map<String, Value>) -> Option<String> {
    match object.get("explanation") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
