//! Blocking HTTP client for the Ollama chat-completion endpoint.
//!
//! Kept synchronous deliberately: the replay scheduler's contract
//! forbids pipelining across steps, so there is nothing to gain from an
//! async transport here and every other crate in this workspace's
//! ancestry reaches for `reqwest::blocking` when a call site is a plain
//! synchronous function.

use nirs_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
struct ChatOptions {
    temperature: u8,
    seed: u64,
    num_ctx: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    options: ChatOptions,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    role: String,
    content: String,
}

pub struct OllamaClient {
    address: String,
    model: String,
    seed: u64,
    num_ctx: u32,
    http: reqwest::blocking::Client,
}

impl OllamaClient {
    pub fn new(address: impl Into<String>, model: impl Into<String>, seed: u64) -> Self {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("default TLS backend is always available");

        Self {
            address: address.into(),
            model: model.into(),
            seed,
            num_ctx: 1024,
            http,
        }
    }

    pub fn with_num_ctx(mut self, num_ctx: u32) -> Self {
        self.num_ctx = num_ctx;
        self
    }

    /// Sends `messages` (system + user, or an accumulated multi-turn
    /// transcript) and returns the assistant's content. A missing or
    /// non-assistant message decodes to an empty string, matching the
    /// reference client's permissive decoding.
    pub fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/api/chat", self.address.trim_end_matches('/'));

        let request = ChatRequest {
            model: &self.model,
            stream: false,
            options: ChatOptions {
                temperature: 0,
                seed: self.seed,
                num_ctx: self.num_ctx,
            },
            messages,
        };

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .map_err(|e| Error::LlmUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::LlmUnavailable(format!(
                "ollama returned status {}",
                response.status()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| Error::LlmUnavailable(e.to_string()))?;

        Ok(parsed
            .message
            .filter(|m| m.role == "assistant")
            .map(|m| m.content)
            .unwrap_or_default())
    }
}

/// Extracts the first `<rule>...</rule>` payload, trimmed. `None` when
/// no tags are present — callers treat this as abstention.
pub fn extract_rule(answer: &str) -> Option<String> {
    let start = answer.find("<rule>")? + "<rule>".len();
    let end = answer[start..].find("</rule>")? + start;
    Some(answer[start..end].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_first_rule_tag_only() {
        let answer = "blah <rule>OK</rule> blah <rule>IGNORED</rule>";
        assert_eq!(extract_rule(answer), Some("OK".to_string()));
    }

    #[test]
    fn returns_none_without_tags() {
        assert_eq!(extract_rule("no tags here"), None);
    }
}
