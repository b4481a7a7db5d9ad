//! Blocking client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use strata_core::config::LlmSettings;
use strata_core::traits::LanguageModel;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("environment variable {0} with the API key is not set")]
    MissingApiKey(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid JSON response: {0}")]
    InvalidJson(String),
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
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

/// Text parts of the first candidate, concatenated. No candidate, or one
/// without text (e.g. a safety block), yields an empty string.
fn extract_text(response: GenerateResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default()
}

pub struct GeminiClient {
    url: String,
    model: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(settings: &LlmSettings, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let mut builder = reqwest::blocking::Client::builder();
        // reqwest's blocking client defaults to 30s; no configured timeout means none at all
        builder = builder.timeout(settings.timeout_secs.map(Duration::from_secs));
        let client = builder
            .build()
            .map_err(|e| LlmError::Http(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            url: format!("{}/{}:generateContent", settings.endpoint.trim_end_matches('/'), settings.model),
            model: settings.model.clone(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Reads the key from the variable named by `api_key_env`.
    pub fn from_env(settings: &LlmSettings) -> Result<Self, LlmError> {
        let key = std::env::var(&settings.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| LlmError::MissingApiKey(settings.api_key_env.clone()))?;
        Self::new(settings, key)
    }

    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "generateContent");
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| if e.is_timeout() { LlmError::Timeout } else { LlmError::Http(format!("request failed: {e}")) })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(LlmError::Http(format!("HTTP {status}: {}", detail.chars().take(300).collect::<String>())));
        }
        let parsed: GenerateResponse = response.json().map_err(|e| LlmError::InvalidJson(e.to_string()))?;
        Ok(extract_text(parsed))
    }
}

impl LanguageModel for GeminiClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        Ok(self.generate(prompt)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> String {
        extract_text(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn first_candidate_parts_are_concatenated() {
        let json = r#"{"candidates":[
            {"content":{"role":"model","parts":[{"text":"TITUL: "},{"text":"Mapa"}]}},
            {"content":{"parts":[{"text":"ignored"}]}}
        ]}"#;
        assert_eq!(parse(json), "TITUL: Mapa");
    }

    #[test]
    fn blocked_or_missing_candidates_yield_empty_text() {
        assert_eq!(parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#), "");
        assert_eq!(parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#), "");
    }

    #[test]
    fn url_joins_endpoint_and_model() {
        let settings = LlmSettings { endpoint: "http://localhost:9/v1beta/".into(), ..LlmSettings::default() };
        let client = GeminiClient::new(&settings, "k").unwrap();
        assert_eq!(client.url, "http://localhost:9/v1beta/models/gemini-3-pro-preview:generateContent");
        assert_eq!(client.model_id(), "models/gemini-3-pro-preview");
    }

    #[test]
    fn missing_key_is_reported_by_variable_name() {
        let settings = LlmSettings { api_key_env: "STRATA_TEST_NO_SUCH_KEY".into(), ..LlmSettings::default() };
        match GeminiClient::from_env(&settings) {
            Err(LlmError::MissingApiKey(var)) => assert_eq!(var, "STRATA_TEST_NO_SUCH_KEY"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
