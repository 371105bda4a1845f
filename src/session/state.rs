use thiserror::Error;
use tracing::warn;

use super::history::ConversationHistory;
use super::message::Message;
use crate::dispatch::{DispatchFailure, DispatchOutcome, Prompt};

/// Where the session is in its turn cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingReply,
}

/// Why a submission was not accepted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("still waiting for the previous reply")]
    Busy,

    #[error("session is closed")]
    Closed,

    #[error("no turn is awaiting a reply")]
    NoTurnInFlight,
}

/// How a completed turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The service answered
    Replied,
    /// The fallback message was appended instead
    FellBack { reason: DispatchFailure },
}

/// State of one assistant session: history, pending flag, unsent draft
#[derive(Debug, Default)]
pub struct SessionState {
    history: ConversationHistory,
    pending: bool,
    draft: String,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn phase(&self) -> Phase {
        if self.pending {
            Phase::AwaitingReply
        } else {
            Phase::Idle
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub(crate) fn clear_draft(&mut self) {
        self.draft.clear();
    }

    /// Validate raw input and start a turn with it
    pub fn begin_turn(&mut self, input: &str) -> Result<Prompt, SubmitError> {
        let prompt = Prompt::parse(input).ok_or(SubmitError::EmptyPrompt)?;
        self.begin_prompt(prompt)
    }

    /// Idle -> AwaitingReply: append the user message and clear the draft
    pub fn begin_prompt(&mut self, prompt: Prompt) -> Result<Prompt, SubmitError> {
        if self.pending {
            return Err(SubmitError::Busy);
        }

        self.history.append(Message::from_prompt(&prompt));
        self.pending = true;
        self.draft.clear();
        Ok(prompt)
    }

    /// AwaitingReply -> Idle: append the reply, or the fallback on failure
    ///
    /// Fails when no turn is in flight; the outcome is then dropped.
    pub fn complete_turn(&mut self, outcome: DispatchOutcome) -> Result<TurnOutcome, SubmitError> {
        if !self.pending {
            warn!("reply arrived with no turn in flight; discarding");
            return Err(SubmitError::NoTurnInFlight);
        }

        let turn = match outcome {
            Ok(reply) => {
                self.history.append(Message::from_reply(&reply));
                TurnOutcome::Replied
            }
            Err(reason) => {
                warn!(%reason, "dispatch failed; appending fallback reply");
                self.history.append(Message::fallback());
                TurnOutcome::FellBack { reason }
            }
        };
        self.pending = false;
        Ok(turn)
    }
}
