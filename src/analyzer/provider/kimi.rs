//! Kimi (Moonshot) provider.
//!
//! Every attempt is two requests: the system prompt on its own, then the
//! system prompt together with the file content. Moonshot answers the second
//! request more reliably once the first has been seen. Both must succeed.

use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

use super::chat::{completions_url, post_chat, ChatMessage, ChatRequest};
use super::{AnalysisProvider, ProviderError, ProviderKind, ProviderOptions, ProviderResult};
use crate::clock::SharedClock;

pub struct KimiProvider {
    client: Client,
    model: String,
    api_key: String,
    url: String,
    prime_settle: Duration,
    clock: SharedClock,
}

impl KimiProvider {
    pub fn new(client: Client, options: ProviderOptions, clock: SharedClock) -> Self {
        Self {
            client,
            url: completions_url(&options.base_url),
            model: options.model,
            api_key: options.api_key,
            prime_settle: options.prime_settle,
            clock,
        }
    }
}

impl AnalysisProvider for KimiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Kimi
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn send(&self, text: &str, prompt: &str) -> ProviderResult<String> {
        let prime = ChatRequest::new(&self.model, vec![ChatMessage::system(prompt)]);
        post_chat(&self.client, &self.url, &self.api_key, &prime)?;

        debug!(secs = self.prime_settle.as_secs(), "Kimi primed, settling");
        self.clock.sleep(self.prime_settle);

        let request = ChatRequest::new(
            &self.model,
            vec![ChatMessage::system(prompt), ChatMessage::user(text)],
        );
        post_chat(&self.client, &self.url, &self.api_key, &request)
    }

    /// Any failed request is retried; a refusal or an unreadable body is not.
    fn is_transient(&self, error: &ProviderError) -> bool {
        matches!(
            error,
            ProviderError::Http { .. } | ProviderError::RateLimited(_) | ProviderError::Transport(_)
        )
    }

    fn update_credential(&mut self, api_key: String) {
        self.api_key = api_key;
    }
}
