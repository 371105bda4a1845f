use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Trimmed, non-empty text of a user turn, as sent to the inference service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prompt(String);

impl Prompt {
    /// Trim the raw input; `None` when nothing is left
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Assistant text returned by a successful dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply(String);

impl Reply {
    /// Keep the service text as sent; `None` when it is blank
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a dispatch produced no reply
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    #[error("inference service unreachable: {0}")]
    Unreachable(String),

    #[error("inference service returned HTTP {0}")]
    Status(u16),

    #[error("malformed reply payload: {0}")]
    MalformedPayload(String),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("request abandoned before a reply arrived")]
    Cancelled,
}

/// Result of a single dispatch: a reply, or the reason there is none
pub type DispatchOutcome = Result<Reply, DispatchFailure>;

/// Request body: `{"prompt": "..."}`
#[derive(Debug, Serialize)]
pub(crate) struct PromptRequest<'a> {
    pub prompt: &'a str,
}

/// Extract the reply from a 2xx response body
///
/// Only a JSON object with a string `bot` field counts; arrays and other
/// shapes are malformed even when they would fill the same fields.
pub(crate) fn parse_reply_payload(body: &[u8]) -> DispatchOutcome {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| DispatchFailure::MalformedPayload(e.to_string()))?;

    let Value::Object(fields) = payload else {
        return Err(DispatchFailure::MalformedPayload(
            "reply body is not a JSON object".to_string(),
        ));
    };

    let bot = match fields.get("bot") {
        Some(Value::String(text)) => text,
        Some(_) => {
            return Err(DispatchFailure::MalformedPayload(
                "`bot` field is not a string".to_string(),
            ))
        }
        None => {
            return Err(DispatchFailure::MalformedPayload(
                "missing `bot` field".to_string(),
            ))
        }
    };

    Reply::parse(bot)
        .ok_or_else(|| DispatchFailure::MalformedPayload("empty `bot` field".to_string()))
}
