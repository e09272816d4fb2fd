//! OpenAI-style chat completion requests, shared by Kimi and DeepSeek.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    retry_after_header, ProviderError, ProviderResult, FREQUENCY_PENALTY, MAX_TOKENS,
    PRESENCE_PENALTY, TEMPERATURE, TOP_P,
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> ChatMessage<'a> {
    pub fn system(content: &'a str) -> Self {
        Self {
            role: "system",
            content,
        }
    }

    pub fn user(content: &'a str) -> Self {
        Self {
            role: "user",
            content,
        }
    }
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub max_tokens: u32,
    pub n: u32,
    pub stream: bool,
}

impl<'a> ChatRequest<'a> {
    pub fn new(model: &'a str, messages: Vec<ChatMessage<'a>>) -> Self {
        Self {
            model,
            messages,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            presence_penalty: PRESENCE_PENALTY,
            frequency_penalty: FREQUENCY_PENALTY,
            max_tokens: MAX_TOKENS,
            n: 1,
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// `<base>/chat/completions` without doubled slashes.
pub fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Send one chat request and return the first choice's text.
pub fn post_chat(
    client: &Client,
    url: &str,
    api_key: &str,
    request: &ChatRequest<'_>,
) -> ProviderResult<String> {
    debug!(url, model = request.model, messages = request.messages.len(), "POST chat completion");

    let response = client.post(url).bearer_auth(api_key).json(request).send()?;
    let status = response.status();
    let retry_after = retry_after_header(response.headers());
    let body = response.text()?;

    if !status.is_success() {
        return Err(ProviderError::from_status(status.as_u16(), retry_after, body));
    }
    parse_chat_response(&body)
}

/// Extract the reply text from a chat completion body.
pub fn parse_chat_response(body: &str) -> ProviderResult<String> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse)?;

    if choice.finish_reason.as_deref() == Some("content_filter") {
        return Err(ProviderError::ContentBlocked(
            "response stopped by content filter".to_string(),
        ));
    }

    match choice.message.and_then(|m| m.content) {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(ProviderError::EmptyResponse),
    }
}
