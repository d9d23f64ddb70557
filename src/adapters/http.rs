use crate::config::toml_config::GeneratorConfig;
use crate::domain::ports::MessagesClient;
use crate::utils::error::{Result, SkillkitError};
use crate::utils::retry::{ensure_success, retry, RetryPolicy};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Posts JSON payloads to chat webhooks (Discord, Slack).
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
    retry: RetryPolicy,
}

impl WebhookClient {
    pub fn new(timeout_seconds: u64, retry: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self { client, retry })
    }

    /// Returns the number of attempts it took.
    pub async fn post_json(
        &self,
        channel: &str,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<u32> {
        let outcome = retry(&self.retry, channel, || async {
            let response = self
                .client
                .post(url)
                .header("Content-Type", "application/json")
                .json(payload)
                .send()
                .await?;
            ensure_success(response).await?;
            Ok(())
        })
        .await;

        match outcome.result {
            Ok(()) => Ok(outcome.attempts),
            Err(e) => Err(SkillkitError::WebhookError {
                channel: channel.to_string(),
                message: format!("{} (after {} attempts)", e, outcome.attempts),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [RequestMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Messages API client used by the skill generator.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl AnthropicClient {
    pub fn new(config: &GeneratorConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/v1/messages", config.api_base.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            retry: config.retry.clone(),
        })
    }

    async fn send_once(&self, prompt: &str) -> Result<String> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: [RequestMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let parsed: MessagesResponse = response.json().await?;

        parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| SkillkitError::ValidationError {
                message: "response contained no text content".to_string(),
            })
    }
}

#[async_trait]
impl MessagesClient for AnthropicClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let outcome = retry(&self.retry, "messages API", || self.send_once(prompt)).await;
        if outcome.attempts > 1 {
            tracing::debug!("Messages API call took {} attempts", outcome.attempts);
        }
        outcome.result
    }
}
