//! Assistant (chatbot) client abstraction
//!
//! The blog talks to an external text-generation service through this
//! trait. The upstream is fallible and potentially slow; callers convert
//! any error into the degraded fallback reply instead of failing the
//! request.

use crate::config::AssistantConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reply used when the upstream service is unreachable or misconfigured
pub const FALLBACK_REPLY: &str =
    "The assistant is unavailable right now. Please try again later.";

/// Trait for conversational text generation
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Send one prompt and get the generated reply
    async fn send(&self, prompt: &str) -> Result<String>;

    /// Model name, for logging
    fn model_name(&self) -> &str;
}

/// Client for a generative-language HTTP API
pub struct GenerativeAssistant {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
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
    content: Content,
}

impl GenerativeAssistant {
    /// Create a client from configuration; fails when no API key is set
    pub fn from_config(config: &AssistantConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AppError::Configuration {
                message: "assistant.api_key is not set".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string()),
        })
    }
}

#[async_trait]
impl Assistant for GenerativeAssistant {
    async fn send(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamUnavailable {
                message: format!("API error {}: {}", status, body),
            });
        }

        let result: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::UpstreamUnavailable {
                    message: format!("Failed to parse response: {}", e),
                })?;

        let reply = result
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if reply.is_empty() {
            return Err(AppError::UpstreamUnavailable {
                message: "Empty response from generation API".to_string(),
            });
        }

        Ok(reply)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Stand-in used when no API key is configured: every request degrades
pub struct DisabledAssistant;

#[async_trait]
impl Assistant for DisabledAssistant {
    async fn send(&self, _prompt: &str) -> Result<String> {
        Err(AppError::UpstreamUnavailable {
            message: "Assistant is not configured".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_assistant_always_degrades() {
        let assistant = DisabledAssistant;
        let err = assistant.send("hello").await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable { .. }));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = AssistantConfig {
            api_key: None,
            api_base: None,
            model: "gemini-1.5-flash".to_string(),
            timeout_secs: 20,
        };

        assert!(GenerativeAssistant::from_config(&config).is_err());
    }

    #[test]
    fn test_fallback_reply_is_user_presentable() {
        assert!(!FALLBACK_REPLY.is_empty());
        assert!(!FALLBACK_REPLY.contains("error"));
    }
}
