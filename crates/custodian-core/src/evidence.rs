//! Evidence normalization for claim verification.
//!
//! Search hits arrive partially populated. Every missing field degrades to an
//! empty string or the `#` link sentinel; nothing here can fail.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of search hits kept as evidence.
pub const MAX_EVIDENCE_ITEMS: usize = 5;

/// Evidence text when the search returned zero results.
pub const NO_EVIDENCE_SENTINEL: &str = "No relevant news found.";

/// Evidence text when the search call itself failed.
pub const SEARCH_UNAVAILABLE_SENTINEL: &str = "Search Tool Unavailable.";

/// Link used when a hit carries none.
pub const MISSING_LINK: &str = "#";

/// A raw result record from a search provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub href: Option<String>,

    /// Primary snippet field
    #[serde(default)]
    pub body: Option<String>,

    /// Alternate snippet field used by some providers
    #[serde(default)]
    pub snippet: Option<String>,
}

impl SearchHit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

/// One normalized piece of evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Ordinal position, starting at 1
    pub index: usize,

    pub body: String,

    /// Source URL, or `#` when absent
    pub link: String,
}

impl EvidenceItem {
    /// Normalize a search hit.
    ///
    /// Body falls back from `body` to `snippet` to empty, with whitespace
    /// runs (newlines included) collapsed to single spaces. A missing or
    /// blank link becomes `#`.
    pub fn from_hit(index: usize, hit: &SearchHit) -> Self {
        let body = hit
            .body
            .as_deref()
            .or(hit.snippet.as_deref())
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let link = hit
            .href
            .as_deref()
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .unwrap_or(MISSING_LINK)
            .to_string();

        Self { index, body, link }
    }

    /// Render as a single evidence line.
    pub fn render(&self) -> String {
        format!("Source {}: {} (Link: {})", self.index, self.body, self.link)
    }
}

/// Evidence handed to the verdict prompt.
///
/// The three variants render to textually distinct strings, so the LLM sees
/// data, an explicit "nothing found", or an explicit tool failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceBundle {
    Found { items: Vec<EvidenceItem> },
    Empty,
    Unavailable { reason: String },
}

impl EvidenceBundle {
    /// Normalize up to `cap` hits, numbered from 1 in provider order.
    pub fn from_hits<I>(hits: I, cap: usize) -> Self
    where
        I: IntoIterator<Item = SearchHit>,
    {
        let items: Vec<EvidenceItem> = hits
            .into_iter()
            .take(cap)
            .enumerate()
            .map(|(i, hit)| EvidenceItem::from_hit(i + 1, &hit))
            .collect();

        if items.is_empty() {
            EvidenceBundle::Empty
        } else {
            EvidenceBundle::Found { items }
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        EvidenceBundle::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn items(&self) -> &[EvidenceItem] {
        match self {
            EvidenceBundle::Found { items } => items,
            _ => &[],
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, EvidenceBundle::Unavailable { .. })
    }

    /// The evidence text: one line per item, or a sentinel.
    pub fn text(&self) -> String {
        match self {
            EvidenceBundle::Found { items } => items
                .iter()
                .map(|item| format!("{}\n", item.render()))
                .collect(),
            EvidenceBundle::Empty => NO_EVIDENCE_SENTINEL.to_string(),
            EvidenceBundle::Unavailable { .. } => SEARCH_UNAVAILABLE_SENTINEL.to_string(),
        }
    }
}

impl fmt::Display for EvidenceBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
