use chrono::{DateTime, Local};
use serde::Serialize;

use crate::constants::FALLBACK_REPLY;
use crate::dispatch::{Prompt, Reply};

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    User,
    Assistant,
}

/// One turn in the conversation
///
/// Fields are private: a message can only be built from a validated prompt, a
/// validated reply, or the fallback text, and never changes afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    origin: Origin,
    text: String,
    created_at: DateTime<Local>,
}

impl Message {
    fn new(origin: Origin, text: String) -> Self {
        Self {
            origin,
            text,
            created_at: Local::now(),
        }
    }

    pub fn from_prompt(prompt: &Prompt) -> Self {
        Self::new(Origin::User, prompt.as_str().to_string())
    }

    pub fn from_reply(reply: &Reply) -> Self {
        Self::new(Origin::Assistant, reply.as_str().to_string())
    }

    /// The assistant turn substituted when dispatch fails
    pub fn fallback() -> Self {
        Self::new(Origin::Assistant, FALLBACK_REPLY.to_string())
    }

    pub fn origin(&self) -> Origin {
        self.origin
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn is_user(&self) -> bool {
        self.origin == Origin::User
    }

    /// Same speaker and same text; timestamps are ignored
    pub fn same_content(&self, other: &Message) -> bool {
        self.origin == other.origin && self.text == other.text
    }
}
