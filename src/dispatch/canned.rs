use async_trait::async_trait;

use super::traits::ResponseDispatcher;
use super::types::{DispatchFailure, DispatchOutcome, Prompt, Reply};
use crate::constants::{
    CANNED_CORE_REPLY, CANNED_DEFAULT_PREFIX, CANNED_LOWER_BODY_REPLY, CANNED_UPPER_BODY_REPLY,
};
use crate::session::QuickIntent;

/// Offline dispatcher answering from a fixed table
///
/// Only selected with `--offline`; it never stands in for the remote service
/// on its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedDispatcher;

impl CannedDispatcher {
    pub fn new() -> Self {
        Self
    }

    fn reply_text(prompt: &Prompt) -> String {
        match QuickIntent::from_label(prompt.as_str()) {
            Some(QuickIntent::UpperBody) => CANNED_UPPER_BODY_REPLY.to_string(),
            Some(QuickIntent::Core) => CANNED_CORE_REPLY.to_string(),
            Some(QuickIntent::LowerBody) => CANNED_LOWER_BODY_REPLY.to_string(),
            None => format!("{}{}", CANNED_DEFAULT_PREFIX, prompt),
        }
    }
}

#[async_trait]
impl ResponseDispatcher for CannedDispatcher {
    async fn send(&self, prompt: &Prompt) -> DispatchOutcome {
        Reply::parse(&Self::reply_text(prompt))
            .ok_or_else(|| DispatchFailure::MalformedPayload("blank canned reply".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ask(text: &str) -> String {
        CannedDispatcher::new()
            .send(&Prompt::parse(text).unwrap())
            .await
            .unwrap()
            .as_str()
            .to_string()
    }

    #[tokio::test]
    async fn test_category_replies() {
        assert_eq!(ask("Upper body").await, CANNED_UPPER_BODY_REPLY);
        assert_eq!(ask("CORE").await, CANNED_CORE_REPLY);
        assert_eq!(ask("lower body").await, CANNED_LOWER_BODY_REPLY);
    }

    #[tokio::test]
    async fn test_default_reply_echoes_prompt() {
        assert_eq!(
            ask("How often should I stretch?").await,
            "This is a static response to your prompt: How often should I stretch?"
        );
    }
}
