//! Scripted providers for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use custodian_core::SearchHit;

use crate::providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
};
use crate::search::{SearchError, SearchProvider};

type Responder = Box<dyn Fn(&str) -> Result<String, ProviderError> + Send + Sync>;

/// LLM fake that answers each prompt through a responder and records calls.
pub struct ScriptedLlm {
    responder: Responder,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedLlm {
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Reply with each entry in turn, then fail.
    pub fn sequence(replies: Vec<Result<String, ProviderError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(replies));
        Self::from_fn(move |_| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::HttpError("no scripted reply left".to_string())))
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let prompt = messages
            .into_iter()
            .map(|m| m.content)
            .collect::<Vec<_>>()
            .join("\n");
        self.prompts.lock().unwrap().push(prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = (self.responder)(&prompt)?;
        Ok(CompletionResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 20,
                cache_read_tokens: 0,
            },
            model: config.model.clone(),
            stop_reason: Some("STOP".to_string()),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

enum SearchScript {
    Hits(Vec<SearchHit>),
    Fail(String),
}

/// Search fake returning fixed hits or a fixed failure.
pub struct ScriptedSearch {
    script: SearchScript,
    queries: Mutex<Vec<(String, usize)>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedSearch {
    pub fn hits(hits: Vec<SearchHit>) -> Self {
        Self::new(SearchScript::Hits(hits))
    }

    pub fn empty() -> Self {
        Self::hits(Vec::new())
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::new(SearchScript::Fail(message.into()))
    }

    fn new(script: SearchScript) -> Self {
        Self {
            script,
            queries: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Queries received, with the requested result cap.
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn text(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.script {
            SearchScript::Hits(hits) => Ok(hits.clone()),
            SearchScript::Fail(message) => Err(SearchError::HttpError(message.clone())),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
