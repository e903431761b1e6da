//! OpenAI-compatible chat completion client.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::OracleConfig;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oracle API error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("oracle reply had no choices")]
    NoChoices,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking client for `POST {base_url}/chat/completions`.
pub struct RemoteClient {
    http: Client,
    url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl RemoteClient {
    /// Builds a client whose every request is bounded by the configured timeout.
    pub fn new(config: &OracleConfig, api_key: &str) -> Result<Self, RemoteError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            http,
            url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Single-turn completion: one system message, one user message.
    pub fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String, RemoteError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens,
            temperature: self.temperature,
        };

        debug!(url = %self.url, model = %self.model, max_tokens, "calling oracle");
        let resp = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(RemoteError::Status { status, body });
        }

        let reply: ChatResponse = resp.json()?;
        let text = reply
            .choices
            .into_iter()
            .next()
            .ok_or(RemoteError::NoChoices)?
            .message
            .content
            .unwrap_or_default();
        Ok(text.trim().to_string())
    }
}
