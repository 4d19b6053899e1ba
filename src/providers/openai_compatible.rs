use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::ProviderConfig;
use crate::providers::ProviderError;
use crate::traits::CompletionBackend;

/// Chat-completions backend speaking the OpenAI-compatible wire format
/// (works against x.ai, OpenAI, OpenRouter, and local gateways).
pub struct OpenAiCompatibleBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl OpenAiCompatibleBackend {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiCompatibleBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user },
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        debug!(model = %self.model, url = %self.base_url, "Calling completion backend");

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                ProviderError::network(&e)
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ProviderError::network(&e))?;

        if !status.is_success() {
            error!(status = %status, "Completion backend error: {}", text);
            return Err(ProviderError::from_status(status.as_u16(), &text));
        }

        let data: Value = serde_json::from_str(&text).map_err(|e| ProviderError {
            kind: crate::providers::ProviderErrorKind::Unknown,
            status: None,
            message: format!("malformed response: {}", e),
        })?;

        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(ProviderError {
                kind: crate::providers::ProviderErrorKind::Unknown,
                status: None,
                message: "empty completion".to_string(),
            });
        }

        Ok(content)
    }
}
