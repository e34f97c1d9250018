//! Anthropic Messages API client.

use std::time::Duration;

use anyhow::{Context, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use ibadah_types::ChatTurn;

use crate::TextCompleter;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const MODEL: &str = "claude-3-haiku-20240307";
const API_VERSION: &str = "2023-06-01";

/// HTTP client for the Anthropic Messages API.
///
/// Built without a key it still constructs, but every completion fails —
/// composers then serve their fallbacks.
pub struct AnthropicClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [ChatTurn],
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

impl AnthropicClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl TextCompleter for AnthropicClient {
    async fn complete(&self, turns: &[ChatTurn], max_tokens: u32) -> anyhow::Result<String> {
        let Some(api_key) = &self.api_key else {
            bail!("Anthropic API key not configured");
        };

        let request = MessagesRequest {
            model: MODEL,
            max_tokens,
            messages: turns,
        };

        let resp = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .context("messages request failed")?;

        if !resp.status().is_success() {
            bail!("messages request returned {}", resp.status());
        }

        let body: MessagesResponse = resp
            .json()
            .await
            .context("messages response parse failed")?;

        let text = body
            .content
            .iter()
            .find(|b| b.block_type == "text")
            .map(|b| b.text.trim().to_string())
            .context("messages response had no text block")?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let turns = vec![ChatTurn::user("Apa itu sabar?")];
        let request = MessagesRequest {
            model: MODEL,
            max_tokens: 100,
            messages: &turns,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "claude-3-haiku-20240307");
        assert_eq!(json["max_tokens"], 100);
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[test]
    fn test_response_parse() {
        let json = r#"{"content":[{"type":"text","text":"  Bersabarlah.  "}]}"#;
        let resp: MessagesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.content[0].text, "  Bersabarlah.  ");
    }

    #[tokio::test]
    async fn test_complete_without_key_fails() {
        let client = AnthropicClient::new(None);
        let err = client
            .complete(&[ChatTurn::user("hi")], 10)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
