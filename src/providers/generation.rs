//! Generation provider capability and the Gemini HTTP backend.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::{ProviderError, ProviderResult};
use crate::config::GenerationConfig;

/// Environment variable consulted when no API key is configured.
const API_KEY_ENV: &str = "GEMINI_API_KEY";

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Maps a prompt to generated text.
///
/// Used identically by the map and reduce steps of the summarizer, and by
/// any caller that later embeds generated text into the knowledge index.
pub trait GenerationProvider: Send + Sync {
    /// Generate text for a prompt, or fail with a typed error.
    fn generate(&self, prompt: &str) -> ProviderResult<String>;
}

/// Generation backend over the Gemini `generateContent` REST endpoint.
///
/// Calls are blocking; a hung request blocks the caller, so timeout and
/// retry policy belong in a [`super::Retrying`] wrapper, not here.
pub struct GeminiProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    system_prompt: Option<String>,
}

impl GeminiProvider {
    /// Create a provider with an explicit API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            api_key: api_key.into(),
            model: "gemini-1.5-flash".to_string(),
            system_prompt: None,
        }
    }

    /// Create a provider from settings. The API key comes from
    /// `generation.api_key` or the `GEMINI_API_KEY` environment variable.
    pub fn from_settings(config: &GenerationConfig) -> ProviderResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .ok_or(ProviderError::MissingApiKey(API_KEY_ENV))?;

        Ok(Self {
            client: reqwest::blocking::Client::new(),
            api_key,
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
        })
    }

    /// Set the model name (e.g. "gemini-1.5-flash").
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a system instruction sent with every request.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl Content {
    fn from_text(text: &str) -> Self {
        Self {
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

impl GenerationProvider for GeminiProvider {
    fn generate(&self, prompt: &str) -> ProviderResult<String> {
        let url = format!(
            "{API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content::from_text(prompt)],
            system_instruction: self.system_prompt.as_deref().map(Content::from_text),
        };

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| ProviderError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Generation(format!(
                "HTTP {status}: {body}"
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        tracing::debug!(
            target: "generation",
            "Content ready in {:.2}s ({} chars)",
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        Ok(text)
    }
}

/// Strip a fenced code block of the given language from generated text.
///
/// Generation models habitually wrap structured output in ```` ```json ````
/// fences; callers feeding that output into the index or a parser want the
/// bare payload.
pub fn strip_code_fence(text: &str, lang: &str) -> String {
    text.replace(&format!("```{lang}"), "")
        .replace("```", "")
        .trim()
        .to_string()
}
