//! DuckDuckGo HTML search provider.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use url::Url;

use custodian_core::SearchHit;

use super::{SearchError, SearchProvider};
use crate::config::SearchSettings;

/// Default HTML endpoint.
pub const DEFAULT_DUCKDUCKGO_URL: &str = "https://html.duckduckgo.com/html/";

/// Search provider backed by DuckDuckGo's HTML results page.
#[derive(Debug, Clone)]
pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    base_url: String,
    region: Option<String>,
    timeout: Duration,
}

impl DuckDuckGoSearch {
    /// Create a provider from search settings.
    pub fn from_settings(settings: &SearchSettings, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| SearchError::NotConfigured(e.to_string()))?;

        Ok(Self {
            client,
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_DUCKDUCKGO_URL.to_string()),
            region: settings.region.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    async fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        let mut form = vec![("q", query.to_string())];
        if let Some(region) = &self.region {
            form.push(("kl", region.clone()));
        }

        let response = self
            .client
            .post(&self.base_url)
            .timeout(self.timeout)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout(self.timeout)
                } else {
                    SearchError::HttpError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| SearchError::HttpError(e.to_string()))?;

        parse_results(&html, max_results)
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

/// Parse organic results from a DuckDuckGo HTML page.
///
/// Ads are skipped and redirect links are unwrapped to their target URL.
pub fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
    let document = Html::parse_document(html);
    let result_selector = selector("div.result")?;
    let title_selector = selector("a.result__a")?;
    let snippet_selector = selector(".result__snippet")?;

    let hits = document
        .select(&result_selector)
        .filter(|result| !is_ad(result))
        .map(|result| {
            let title_link = result.select(&title_selector).next();
            SearchHit {
                title: title_link.map(element_text).filter(|t| !t.is_empty()),
                href: title_link
                    .and_then(|a| a.value().attr("href"))
                    .map(resolve_link),
                body: result
                    .select(&snippet_selector)
                    .next()
                    .map(element_text)
                    .filter(|t| !t.is_empty()),
                snippet: None,
            }
        })
        .filter(|hit| hit.title.is_some() || hit.body.is_some())
        .take(max_results)
        .collect();

    Ok(hits)
}

fn selector(css: &'static str) -> Result<Selector, SearchError> {
    Selector::parse(css).map_err(|e| SearchError::ParseError(format!("{}: {}", css, e)))
}

fn is_ad(result: &ElementRef<'_>) -> bool {
    result
        .value()
        .classes()
        .any(|class| class == "result--ad")
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unwrap `//duckduckgo.com/l/?uddg=<target>` redirects.
fn resolve_link(href: &str) -> String {
    let parsed = Url::parse("https://duckduckgo.com/").and_then(|base| base.join(href));

    match parsed {
        Ok(url) => url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, target)| target.into_owned())
            .unwrap_or_else(|| url.to_string()),
        Err(_) => href.to_string(),
    }
}
