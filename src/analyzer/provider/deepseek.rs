//! DeepSeek provider.
//!
//! One chat completion per attempt. DeepSeek's API fails in many transient
//! ways (overload, truncated bodies, dropped connections), so every failure is
//! retried except an explicit content rejection.

use reqwest::blocking::Client;

use super::chat::{completions_url, post_chat, ChatMessage, ChatRequest};
use super::{AnalysisProvider, ProviderError, ProviderKind, ProviderOptions, ProviderResult};

pub struct DeepSeekProvider {
    client: Client,
    model: String,
    api_key: String,
    url: String,
}

impl DeepSeekProvider {
    pub fn new(client: Client, options: ProviderOptions) -> Self {
        Self {
            client,
            url: completions_url(&options.base_url),
            model: options.model,
            api_key: options.api_key,
        }
    }
}

impl AnalysisProvider for DeepSeekProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::DeepSeek
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn send(&self, text: &str, prompt: &str) -> ProviderResult<String> {
        let request = ChatRequest::new(
            &self.model,
            vec![ChatMessage::system(prompt), ChatMessage::user(text)],
        );
        post_chat(&self.client, &self.url, &self.api_key, &request)
    }

    fn is_transient(&self, error: &ProviderError) -> bool {
        !matches!(
            error,
            ProviderError::ContentBlocked(_) | ProviderError::MissingCredential { .. }
        )
    }

    fn update_credential(&mut self, api_key: String) {
        self.api_key = api_key;
    }
}
