//! Gemini provider.
//!
//! Calls `POST {base}/v1beta/models/{model}:generateContent` with the prompt
//! and the file content joined into one user turn. Only overload-type
//! failures are retried; a blocked prompt or a 4xx is final.

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    retry_after_header, AnalysisProvider, ProviderError, ProviderKind, ProviderOptions,
    ProviderResult, MAX_TOKENS, TEMPERATURE, TOP_P,
};

/// The key travels in a header so it never shows up in a URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Finish reasons that mean the model refused to answer.
const BLOCKING_FINISH_REASONS: &[&str] = &["SAFETY", "BLOCKLIST", "PROHIBITED_CONTENT", "RECITATION"];

pub struct GeminiProvider {
    client: Client,
    model: String,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(client: Client, options: ProviderOptions) -> Self {
        Self {
            client,
            model: options.model,
            api_key: options.api_key,
            base_url: options.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

/// Request body for `generateContent`.
pub fn request_body(text: &str, prompt: &str) -> Value {
    json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": format!("{}\n\n{}", prompt, text) }]
        }],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "topP": TOP_P,
            "maxOutputTokens": MAX_TOKENS,
            "candidateCount": 1
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Extract the generated text from a `generateContent` body.
pub fn parse_response(body: &str) -> ProviderResult<String> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    if let Some(reason) = parsed.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ProviderError::ContentBlocked(format!(
            "blocked prompt ({})",
            reason
        )));
    }

    let candidate = parsed
        .candidates
        .into_iter()
        .next()
        .ok_or(ProviderError::EmptyResponse)?;

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            return Err(ProviderError::ContentBlocked(format!(
                "response stopped ({})",
                reason
            )));
        }
    }

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ProviderError::EmptyResponse);
    }
    Ok(text)
}

impl AnalysisProvider for GeminiProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn send(&self, text: &str, prompt: &str) -> ProviderResult<String> {
        let url = self.endpoint();
        debug!(url = %url, "POST generateContent");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request_body(text, prompt))
            .send()?;
        let status = response.status();
        let retry_after = retry_after_header(response.headers());
        let body = response.text()?;

        if !status.is_success() {
            return Err(ProviderError::from_status(status.as_u16(), retry_after, body));
        }
        parse_response(&body)
    }

    fn is_transient(&self, error: &ProviderError) -> bool {
        error.is_unavailable()
    }

    fn update_credential(&mut self, api_key: String) {
        self.api_key = api_key;
    }
}
