use std::time::Duration;

use log::warn;
use serde_json::{json, Value};
use thiserror::Error;

/// How long an upstream webhook gets to answer
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// The reply fields upstreams are known to answer with, in order of
/// preference
const REPLY_FIELDS: [&str; 4] = ["reply", "response", "text", "message"];

/// Forwards visitor messages to an upstream webhook and normalizes
/// whatever shape of reply comes back
pub struct ChatRelay {
    client: reqwest::Client,
    webhook_url: String,
}

/// Relay failures deliberately carry no upstream response content, so
/// nothing from the other side leaks through error messages
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("The message must not be empty")]
    InvalidMessage,
    #[error("The upstream service took too long to respond")]
    Timeout,
    #[error("The upstream service could not be reached")]
    Network,
    #[error("The upstream service responded with status {status}")]
    Upstream { status: u16 },
}

impl ChatRelay {
    pub fn new(webhook_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .expect("client is built with valid settings");

        Self {
            client,
            webhook_url,
        }
    }

    /// Forwards a message and returns the upstream's reply text
    pub async fn forward(&self, message: &str) -> Result<String, RelayError> {
        let message = message.trim();

        if message.is_empty() {
            return Err(RelayError::InvalidMessage);
        }

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&json!({ "message": message }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::Timeout
                } else {
                    RelayError::Network
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            warn!("Upstream webhook responded with status {}", status);
            return Err(RelayError::Upstream {
                status: status.as_u16(),
            });
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);

        let body = response.text().await.map_err(|_| RelayError::Network)?;

        if is_json {
            if let Ok(value) = serde_json::from_str::<Value>(&body) {
                if let Some(reply) = first_reply_field(&value) {
                    return Ok(reply);
                }
            }
        }

        Ok(body)
    }
}

/// Picks the first known reply field that holds a string
fn first_reply_field(value: &Value) -> Option<String> {
    REPLY_FIELDS
        .iter()
        .find_map(|field| value.get(field).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reply_fields_resolve_in_order() {
        let both = json!({ "response": "second", "reply": "first" });
        assert_eq!(first_reply_field(&both).as_deref(), Some("first"));

        let fallback = json!({ "message": "last resort" });
        assert_eq!(first_reply_field(&fallback).as_deref(), Some("last resort"));
    }

    #[test]
    fn non_string_reply_fields_are_skipped() {
        let mixed = json!({ "reply": 42, "text": "hi" });
        assert_eq!(first_reply_field(&mixed).as_deref(), Some("hi"));

        let unrelated = json!({ "status": "ok" });
        assert_eq!(first_reply_field(&unrelated), None);
    }

    #[test]
    fn errors_reveal_nothing_from_upstream() {
        let error = RelayError::Upstream { status: 500 };
        assert_eq!(
            error.to_string(),
            "The upstream service responded with status 500"
        );
    }
}
