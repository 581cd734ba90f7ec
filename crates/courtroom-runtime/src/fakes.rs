//! In-memory provider fakes (testing only)
//!
//! `ScriptedProvider` replays a queue of canned outcomes, one per call, and
//! records every request it receives so tests can assert on stage inputs.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::providers::{
    ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError, TokenUsage,
};

// ---------------------------------------------------------------------------
// ScriptedProvider
// ---------------------------------------------------------------------------

enum Scripted {
    Reply(String),
    Fail(ProviderError),
}

/// Provider that answers from a script instead of a model.
///
/// Each call to [`LlmProvider::complete`] consumes the next scripted outcome.
/// An exhausted script fails with `ProviderError::NotConfigured`.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    delay: Option<Duration>,
    reported_usage: Option<TokenUsage>,
    credential_missing: bool,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script one successful reply per entry, in call order.
    pub fn with_replies(replies: Vec<String>) -> Self {
        let provider = Self::new();
        provider
            .script
            .lock()
            .extend(replies.into_iter().map(Scripted::Reply));
        provider
    }

    /// Append a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.script.lock().push_back(Scripted::Reply(text.into()));
        self
    }

    /// Append a failed call.
    pub fn fail(self, error: ProviderError) -> Self {
        self.script.lock().push_back(Scripted::Fail(error));
        self
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report `usage` for every reply instead of an estimate.
    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.reported_usage = Some(usage);
        self
    }

    /// Report an unusable credential from `health_check`.
    pub fn without_credential(mut self) -> Self {
        self.credential_missing = true;
        self
    }

    /// Number of `complete` calls received so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    /// Every request received, in call order.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }

    /// Content of the user message of call `index`.
    pub fn user_input(&self, index: usize) -> Option<String> {
        self.requests.lock().get(index).and_then(|messages| {
            messages
                .iter()
                .find(|m| m.role == "user")
                .map(|m| m.content.clone())
        })
    }

    /// Content of the system message of call `index`.
    pub fn system_instruction(&self, index: usize) -> Option<String> {
        self.requests.lock().get(index).and_then(|messages| {
            messages
                .iter()
                .find(|m| m.role == "system")
                .map(|m| m.content.clone())
        })
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let prompt_tokens: u32 = messages
            .iter()
            .map(|m| self.estimate_tokens(&m.content))
            .sum();
        self.requests.lock().push(messages);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = self.script.lock().pop_front();
        match next {
            Some(Scripted::Reply(content)) => Ok(CompletionResponse {
                usage: self.reported_usage.unwrap_or_else(|| TokenUsage {
                    prompt_tokens,
                    completion_tokens: self.estimate_tokens(&content),
                }),
                content,
                model: config.model.clone(),
            }),
            Some(Scripted::Fail(error)) => Err(error),
            None => Err(ProviderError::NotConfigured(
                "scripted provider has no replies left".to_string(),
            )),
        }
    }

    async fn health_check(&self) -> bool {
        !self.credential_missing
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
