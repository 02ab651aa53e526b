//! Groq chat-completions backend for prompt refinement
//!
//! Speaks the OpenAI-compatible `/openai/v1/chat/completions` route.

use crate::config::{KilnConfig, REFINER};
use crate::provider::CompletionBackend;
use crate::providers::http::{bearer, body_error, build_agent, request_error};
use kiln_core::{KilnError, Result};
use serde_json::{json, Value};

const DEFAULT_GROQ_URL: &str = "https://api.groq.com";
const COMPLETIONS_PATH: &str = "/openai/v1/chat/completions";

/// Groq completion backend
pub struct GroqBackend {
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
    agent: ureq::Agent,
}

impl GroqBackend {
    /// Create a new GroqBackend from config
    pub fn from_config(config: &KilnConfig) -> Result<Self> {
        let api_key = config
            .api_key(REFINER)
            .ok_or_else(|| {
                KilnError::Config(
                    "Groq API key not configured. Set GROQ_API_KEY or add to .kiln/config.toml"
                        .to_string(),
                )
            })?
            .to_string();

        let api_url = config
            .api_url(REFINER)
            .unwrap_or(DEFAULT_GROQ_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            api_url,
            model: config.generation.refine_model.clone(),
            max_tokens: config.generation.refine_max_tokens,
            agent: build_agent(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.api_url, COMPLETIONS_PATH)
    }
}

impl CompletionBackend for GroqBackend {
    fn name(&self) -> &str {
        "groq"
    }

    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let url = self.endpoint();
        let payload = completion_payload(&self.model, self.max_tokens, system, user);

        let mut response = self
            .agent
            .post(&url)
            .header("Authorization", &bearer(&self.api_key))
            .header("Content-Type", "application/json")
            .send_json(&payload)
            .map_err(|e| request_error(&url, e))?;

        let body: Value = response
            .body_mut()
            .read_json()
            .map_err(|e| body_error(&url, e))?;

        parse_completion(&body)
    }
}

/// Chat-completions request body: one system turn, then the user prompt
pub fn completion_payload(model: &str, max_tokens: u32, system: &str, user: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": user}
        ],
        "max_tokens": max_tokens
    })
}

/// Extract `choices[0].message.content` from a chat-completions body
pub fn parse_completion(body: &Value) -> Result<String> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| KilnError::Parse("completion response has no message content".to_string()))
}
