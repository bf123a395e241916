//! # custodian-core
//!
//! Deterministic building blocks for Custodian claim verification.
//!
//! This crate answers the questions that never need a network call:
//! - Is this input worth verifying at all? (guardrail)
//! - How do raw search hits become evidence text?
//! - What did the LLM actually decide?
//!
//! ## Key Guarantees
//!
//! 1. **No I/O**: nothing in this crate touches the network or filesystem
//! 2. **Total**: guardrail routing and evidence normalization cannot fail
//! 3. **One output type**: every answer is a [`VerdictRecord`]
//!
//! ## Example
//!
//! ```rust
//! use custodian_core::{guardrail, Claim, Decider};
//!
//! let claim = Claim::new("Is the economy doing well");
//! let record = guardrail::route(&claim).record().unwrap();
//! assert_eq!(record.decider, Decider::GuardrailRouting);
//! ```

pub mod evidence;
pub mod guardrail;
pub mod types;
pub mod verdict;

// Re-export main types at crate root
pub use evidence::{
    EvidenceBundle, EvidenceItem, SearchHit, MAX_EVIDENCE_ITEMS, NO_EVIDENCE_SENTINEL,
    SEARCH_UNAVAILABLE_SENTINEL,
};
pub use guardrail::{GuardrailDecision, GuardrailPolicy, GuardrailReason, GUARDRAIL_CONFIDENCE};
pub use types::{
    normalize_claim, Claim, Decider, DeciderParseError, SearchTerm, Verdict, VerdictRecord,
    AGENT_DECIDER, GUARDRAIL_DECIDER,
};
pub use verdict::{parse_verdict_reply, strip_code_fences, VerdictParseError, VerdictReply};
