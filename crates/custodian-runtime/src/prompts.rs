//! Prompts for the query optimizer and the verdict synthesizer.
//!
//! Claim and evidence text are inserted verbatim. The verdict prompt names
//! both evidence sentinels so an empty or failed search reads as "no
//! evidence" rather than as a statement about the claim.

use custodian_core::{Claim, NO_EVIDENCE_SENTINEL, SEARCH_UNAVAILABLE_SENTINEL};

/// Instruction for rewriting a claim into a search query.
pub const QUERY_OPTIMIZER_PROMPT: &str = "Convert this user claim into a simple 5-7 word \
Google search query. Output ONLY the search query, with no explanation, quotes or formatting.";

/// Role line for the verdict call.
pub const VERIFIER_ROLE: &str = "You are CUSTODIAN, a fact-checking AI.";

/// Decision policy and output contract for the verdict call.
pub const VERDICT_INSTRUCTIONS: &str = r#"INSTRUCTIONS:
- Use the LIVE EVIDENCE to judge the claim.
- If the evidence confirms the event (even if it's recent), verdict is 'likely_true'.
- If the evidence contradicts the claim, verdict is 'likely_false'.
- If the evidence is empty, verdict is 'uncertain'.
- Return confidence as a float between 0 and 1.

Return JSON only: { "verdict": "likely_true" | "likely_false" | "uncertain", "confidence": float, "explanation": "..." }"#;

/// Prompt asking for a 5-7 word search query.
pub fn optimizer_prompt(claim: &Claim) -> String {
    format!("{}\nClaim: {}", QUERY_OPTIMIZER_PROMPT, claim)
}

/// Prompt asking for a structured verdict on `claim` given `evidence`.
pub fn verification_prompt(claim: &Claim, evidence: &str) -> String {
    format!(
        "{role}\n\nLIVE EVIDENCE:\n{evidence}\n\nUSER CLAIM:\n{claim}\n\n{instructions}\n\
         Evidence reading \"{empty}\" or \"{unavailable}\" counts as empty.\n",
        role = VERIFIER_ROLE,
        evidence = evidence,
        claim = claim,
        instructions = VERDICT_INSTRUCTIONS,
        empty = NO_EVIDENCE_SENTINEL,
        unavailable = SEARCH_UNAVAILABLE_SENTINEL,
    )
}
