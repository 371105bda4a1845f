use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::intent::QuickIntent;
use super::state::{SessionState, SubmitError, TurnOutcome};
use super::view_sync::{ViewReceiver, ViewSync};
use crate::dispatch::{DispatchFailure, DispatchOutcome, Prompt, ResponseDispatcher};

/// Drives one assistant session: input in, user turn, dispatch, reply or fallback
///
/// `submit` takes `&mut self`, so one controller can only have one turn in
/// flight. Dropping a `submit` future abandons the request: its reply can no
/// longer reach the session, and the turn is closed with the fallback
/// message so the session is idle again.
pub struct SessionController {
    state: SessionState,
    dispatcher: Arc<dyn ResponseDispatcher>,
    view: ViewSync,
    timeout: Duration,
}

impl SessionController {
    /// Open a session with an empty history
    pub fn new(dispatcher: Arc<dyn ResponseDispatcher>, timeout: Duration) -> Self {
        Self {
            state: SessionState::new(),
            dispatcher,
            view: ViewSync::new(),
            timeout,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Follow history and pending changes
    pub fn subscribe(&self) -> ViewReceiver {
        self.view.subscribe()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state.set_draft(text);
    }

    /// Submit typed text; blank input is rejected without touching the session
    pub async fn submit(&mut self, input: &str) -> Result<TurnOutcome, SubmitError> {
        let prompt = self.begin(input)?;
        let reply = self.dispatch(prompt);
        let turn = InFlightTurn {
            controller: Some(self),
        };
        let outcome = reply.await;
        turn.complete(outcome)
    }

    /// Submit whatever is in the draft buffer
    pub async fn submit_draft(&mut self) -> Result<TurnOutcome, SubmitError> {
        let draft = self.state.draft().to_string();
        self.submit(&draft).await
    }

    /// Quick-select goes through the same path as typed text
    pub async fn select(&mut self, intent: QuickIntent) -> Result<TurnOutcome, SubmitError> {
        self.submit(intent.label()).await
    }

    pub(crate) fn begin(&mut self, input: &str) -> Result<Prompt, SubmitError> {
        let prompt = self.state.begin_turn(input)?;
        self.view.publish(&self.state);
        Ok(prompt)
    }

    pub(crate) fn begin_prompt(&mut self, prompt: Prompt) -> Result<Prompt, SubmitError> {
        let prompt = self.state.begin_prompt(prompt)?;
        self.view.publish(&self.state);
        Ok(prompt)
    }

    /// A queued submission clears the draft like any other submit
    pub(crate) fn note_queued(&mut self) {
        self.state.clear_draft();
        self.view.publish(&self.state);
    }

    /// The request future for `prompt`, bounded by the session timeout
    ///
    /// It owns everything it needs, so the caller may keep mutating the
    /// controller while it runs.
    pub(crate) fn dispatch(
        &self,
        prompt: Prompt,
    ) -> impl Future<Output = DispatchOutcome> + Send + 'static {
        let dispatcher = Arc::clone(&self.dispatcher);
        let limit = self.timeout;

        async move {
            debug!(prompt = %prompt, "awaiting reply");
            match tokio::time::timeout(limit, dispatcher.send(&prompt)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(DispatchFailure::Timeout(limit)),
            }
        }
    }

    pub(crate) fn finish(&mut self, outcome: DispatchOutcome) -> Result<TurnOutcome, SubmitError> {
        let turn = self.state.complete_turn(outcome)?;
        self.view.publish(&self.state);
        Ok(turn)
    }
}

/// Closes the turn started by `submit` even when its future is dropped
struct InFlightTurn<'a> {
    controller: Option<&'a mut SessionController>,
}

impl InFlightTurn<'_> {
    fn complete(mut self, outcome: DispatchOutcome) -> Result<TurnOutcome, SubmitError> {
        match self.controller.take() {
            Some(controller) => controller.finish(outcome),
            None => Err(SubmitError::NoTurnInFlight),
        }
    }
}

impl Drop for InFlightTurn<'_> {
    fn drop(&mut self) {
        if let Some(controller) = self.controller.take() {
            debug!("submit dropped with a request in flight");
            let _ = controller.finish(Err(DispatchFailure::Cancelled));
        }
    }
}
