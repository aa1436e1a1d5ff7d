use reqwest::Client;
use serde_json::{json, Value};

use crate::config::Config;
use crate::core::{CompletionClient, Error, Message, Result};

const MAX_TOKENS: u32 = 1000;

/// Chat-completions client. Temperature is pinned to zero and the response
/// stops at the first newline, so each call yields one deterministic,
/// single-line command.
#[derive(Debug)]
pub struct OpenAiClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        model: impl Into<String>,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.model, &config.api_url, &config.api_key)
    }
}

#[async_trait::async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        tracing::debug!(model = %self.model, turns = messages.len(), "requesting completion");

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": messages,
                "n": 1,
                "temperature": 0,
                "stop": ["\n"],
                "max_tokens": MAX_TOKENS,
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    Error::CompletionError(format!(
                        "could not reach {}. Check your network connection.",
                        self.api_url
                    ))
                } else if e.is_timeout() {
                    Error::CompletionError("the completion request timed out".to_string())
                } else {
                    Error::CompletionError(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::CompletionError(format!("failed to read response: {}", e)))?;

        let body: Value = serde_json::from_str(&text).map_err(|_| {
            Error::CompletionError(format!("unexpected response ({}): {}", status, text))
        })?;

        // The API reports auth/quota/model problems in an error object
        // alongside a non-2xx status.
        if let Some(error) = body.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(Error::CompletionError(format!("{} ({})", message, status)));
        }

        let command = extract_command(&body).unwrap_or_default();
        if command.is_empty() {
            return Err(Error::CompletionError(
                "the model returned an empty completion".to_string(),
            ));
        }

        tracing::debug!(command = %command, "completion received");
        Ok(command)
    }
}

fn extract_command(body: &Value) -> Option<String> {
    let content = body
        .get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()?;
    Some(content.trim().to_string())
}
