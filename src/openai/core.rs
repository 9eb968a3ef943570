use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Message {
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: Some(content.to_string()),
        }
    }
}

/// Output constraint sent as `response_format`. Only JSON mode is
/// needed here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ResponseFormat {
    JsonObject,
}

impl ResponseFormat {
    fn to_json(self) -> Value {
        match self {
            ResponseFormat::JsonObject => json!({"type": "json_object"}),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },
}

impl CompletionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CompletionError::Http(e) if e.is_timeout())
    }
}

/// Calls an OpenAI compatible chat completions endpoint and returns
/// the decoded response body. Non-2xx responses are returned as
/// `CompletionError::Upstream` with the body text for logging.
pub async fn completion(
    messages: &[Message],
    response_format: Option<ResponseFormat>,
    api_hostname: &str,
    api_key: &str,
    model: &str,
    timeout: Duration,
) -> Result<Value, CompletionError> {
    let mut payload = json!({
        "model": model,
        "messages": messages,
    });
    if let Some(format) = response_format {
        payload["response_format"] = format.to_json();
    }
    let url = format!("{}/v1/chat/completions", api_hostname.trim_end_matches("/"));
    let response = reqwest::Client::new()
        .post(url)
        .bearer_auth(api_key)
        .header("Content-Type", "application/json")
        .timeout(timeout)
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CompletionError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json().await?)
}

/// The assistant text of the first choice, if any.
pub fn message_content(response: &Value) -> Option<&str> {
    response["choices"][0]["message"]["content"].as_str()
}
