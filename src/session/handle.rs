use std::collections::VecDeque;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::controller::SessionController;
use super::intent::QuickIntent;
use super::state::SubmitError;
use super::view_sync::ViewReceiver;
use crate::app::SubmitPolicy;
use crate::constants::{MAX_QUEUED_PROMPTS, SESSION_COMMAND_BUFFER};
use crate::dispatch::Prompt;

/// How a submission was taken in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accepted {
    /// The turn started and its request is on the way
    Started,
    /// Held behind the current turn; `position` 1 is next
    Queued { position: usize },
}

type Ack = oneshot::Sender<Result<Accepted, SubmitError>>;

enum SessionCommand {
    Submit { input: String, ack: Ack },
    SubmitDraft { ack: Ack },
    SetDraft(String),
    CloseWhenIdle,
}

/// Owner-side handle of a session running on its own task
///
/// Dropping the handle, or calling [`SessionHandle::close`], tears the
/// session down. A request still in flight at that point is abandoned and
/// its reply is never applied.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    view: ViewReceiver,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Move `controller` onto a task that applies `policy` to overlapping submissions
    pub fn spawn(controller: SessionController, policy: SubmitPolicy) -> Self {
        let (commands, rx) = mpsc::channel(SESSION_COMMAND_BUFFER);
        let view = controller.subscribe();

        let actor = SessionActor {
            controller,
            policy,
            rx,
            queue: VecDeque::new(),
            closing: false,
        };
        let task = tokio::spawn(actor.run());

        Self {
            commands,
            view,
            task,
        }
    }

    /// Submit typed text; resolves once the submission is started or queued
    pub async fn submit(&self, input: impl Into<String>) -> Result<Accepted, SubmitError> {
        let input = input.into();
        self.request(|ack| SessionCommand::Submit { input, ack }).await
    }

    /// Submit a quick-select label through the typed-text path
    pub async fn select(&self, intent: QuickIntent) -> Result<Accepted, SubmitError> {
        self.submit(intent.label()).await
    }

    /// Submit the draft buffer
    pub async fn submit_draft(&self) -> Result<Accepted, SubmitError> {
        self.request(|ack| SessionCommand::SubmitDraft { ack }).await
    }

    pub async fn set_draft(&self, text: impl Into<String>) -> Result<(), SubmitError> {
        self.commands
            .send(SessionCommand::SetDraft(text.into()))
            .await
            .map_err(|_| SubmitError::Closed)
    }

    /// A fresh receiver for history and pending updates
    pub fn subscribe(&self) -> ViewReceiver {
        self.view.clone()
    }

    /// Let the current turn and any queued ones finish, then tear down
    pub async fn close_when_idle(self) {
        let Self { commands, task, .. } = self;
        // Keep the sender alive until the task exits, or it would see a hang-up
        let _ = commands.send(SessionCommand::CloseWhenIdle).await;
        if let Err(e) = task.await {
            warn!("session task ended abnormally: {}", e);
        }
    }

    /// Tear the session down now and wait for its task to stop
    pub async fn close(self) {
        let Self { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            warn!("session task ended abnormally: {}", e);
        }
    }

    async fn request(
        &self,
        build: impl FnOnce(Ack) -> SessionCommand,
    ) -> Result<Accepted, SubmitError> {
        let (ack, response) = oneshot::channel();
        self.commands
            .send(build(ack))
            .await
            .map_err(|_| SubmitError::Closed)?;
        response.await.map_err(|_| SubmitError::Closed)?
    }
}

struct SessionActor {
    controller: SessionController,
    policy: SubmitPolicy,
    rx: mpsc::Receiver<SessionCommand>,
    queue: VecDeque<Prompt>,
    closing: bool,
}

impl SessionActor {
    async fn run(mut self) {
        info!(policy = ?self.policy, "session opened");

        'session: loop {
            if self.closing && self.queue.is_empty() {
                break 'session;
            }

            let prompt = match self.queue.pop_front() {
                Some(prompt) => match self.controller.begin_prompt(prompt) {
                    Ok(prompt) => prompt,
                    Err(e) => {
                        warn!("queued prompt could not start: {}", e);
                        continue;
                    }
                },
                None => match self.rx.recv().await {
                    Some(command) => match self.on_idle(command) {
                        Some(prompt) => prompt,
                        None => continue,
                    },
                    None => break 'session,
                },
            };

            let reply = self.controller.dispatch(prompt);
            tokio::pin!(reply);

            loop {
                tokio::select! {
                    outcome = &mut reply => {
                        if let Err(e) = self.controller.finish(outcome) {
                            warn!("reply could not be applied: {}", e);
                        }
                        break;
                    }
                    command = self.rx.recv() => match command {
                        Some(command) => self.on_busy(command),
                        None => {
                            debug!("session closed with a request in flight; its reply will be discarded");
                            break 'session;
                        }
                    },
                }
            }
        }

        info!(
            messages = self.controller.state().history().len(),
            "session closed"
        );
    }

    /// Handle a command while no turn is in flight; returns the prompt of a new turn
    fn on_idle(&mut self, command: SessionCommand) -> Option<Prompt> {
        match command {
            SessionCommand::Submit { input, ack } => self.start(&input, ack),
            SessionCommand::SubmitDraft { ack } => {
                let draft = self.controller.state().draft().to_string();
                self.start(&draft, ack)
            }
            SessionCommand::SetDraft(text) => {
                self.controller.set_draft(text);
                None
            }
            SessionCommand::CloseWhenIdle => {
                self.closing = true;
                None
            }
        }
    }

    fn start(&mut self, input: &str, ack: Ack) -> Option<Prompt> {
        match self.controller.begin(input) {
            Ok(prompt) => {
                let _ = ack.send(Ok(Accepted::Started));
                Some(prompt)
            }
            Err(e) => {
                let _ = ack.send(Err(e));
                None
            }
        }
    }

    /// Handle a command while a reply is outstanding
    fn on_busy(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Submit { input, ack } => {
                let _ = ack.send(self.hold(&input));
            }
            SessionCommand::SubmitDraft { ack } => {
                let draft = self.controller.state().draft().to_string();
                let _ = ack.send(self.hold(&draft));
            }
            SessionCommand::SetDraft(text) => self.controller.set_draft(text),
            SessionCommand::CloseWhenIdle => self.closing = true,
        }
    }

    fn hold(&mut self, input: &str) -> Result<Accepted, SubmitError> {
        let prompt = Prompt::parse(input).ok_or(SubmitError::EmptyPrompt)?;

        match self.policy {
            SubmitPolicy::Reject => {
                warn!(prompt = %prompt, "submission rejected while awaiting a reply");
                Err(SubmitError::Busy)
            }
            SubmitPolicy::Queue if self.queue.len() >= MAX_QUEUED_PROMPTS => {
                warn!(prompt = %prompt, "submission rejected; queue is full");
                Err(SubmitError::Busy)
            }
            SubmitPolicy::Queue => {
                self.queue.push_back(prompt);
                self.controller.note_queued();
                debug!(queued = self.queue.len(), "submission queued");
                Ok(Accepted::Queued {
                    position: self.queue.len(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FALLBACK_REPLY;
    use crate::dispatch::{DispatchFailure, DispatchOutcome, Reply, ResponseDispatcher};
    use crate::session::Origin;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Holds every request until the test releases an outcome for it
    struct GatedDispatcher {
        outcomes: Mutex<mpsc::UnboundedReceiver<DispatchOutcome>>,
        seen: mpsc::UnboundedSender<String>,
    }

    struct Gate {
        release: mpsc::UnboundedSender<DispatchOutcome>,
        seen: mpsc::UnboundedReceiver<String>,
    }

    impl Gate {
        fn reply(&self, text: &str) {
            self.release.send(Ok(Reply::parse(text).unwrap())).unwrap();
        }

        fn fail(&self) {
            self.release
                .send(Err(DispatchFailure::Status(502)))
                .unwrap();
        }

        async fn next_prompt(&mut self) -> String {
            self.seen.recv().await.unwrap()
        }
    }

    #[async_trait]
    impl ResponseDispatcher for GatedDispatcher {
        async fn send(&self, prompt: &Prompt) -> DispatchOutcome {
            let _ = self.seen.send(prompt.as_str().to_string());
            let mut outcomes = self.outcomes.lock().await;
            outcomes
                .recv()
                .await
                .unwrap_or(Err(DispatchFailure::Unreachable("gate dropped".to_string())))
        }
    }

    fn gated() -> (Arc<GatedDispatcher>, Gate) {
        let (release, outcomes) = mpsc::unbounded_channel();
        let (seen_tx, seen) = mpsc::unbounded_channel();
        let dispatcher = Arc::new(GatedDispatcher {
            outcomes: Mutex::new(outcomes),
            seen: seen_tx,
        });
        (dispatcher, Gate { release, seen })
    }

    fn spawn(dispatcher: Arc<GatedDispatcher>, policy: SubmitPolicy) -> SessionHandle {
        let controller = SessionController::new(dispatcher, Duration::from_secs(30));
        SessionHandle::spawn(controller, policy)
    }

    fn texts(view: &crate::session::SessionView) -> Vec<(Origin, String)> {
        view.messages
            .iter()
            .map(|m| (m.origin(), m.text().to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_turn_completes_through_handle() {
        let (dispatcher, mut gate) = gated();
        let session = spawn(dispatcher, SubmitPolicy::Reject);
        let mut view = session.subscribe();

        assert_eq!(session.submit("Core").await, Ok(Accepted::Started));
        assert_eq!(gate.next_prompt().await, "Core");
        assert!(view.current().pending);

        gate.reply("Core exercises include planks.");
        let done = view.wait_for(|v| !v.pending).await.unwrap();
        assert_eq!(
            texts(&done),
            vec![
                (Origin::User, "Core".to_string()),
                (Origin::Assistant, "Core exercises include planks.".to_string()),
            ]
        );

        session.close().await;
    }

    #[tokio::test]
    async fn test_reject_policy_refuses_while_pending() {
        let (dispatcher, mut gate) = gated();
        let session = spawn(dispatcher, SubmitPolicy::Reject);
        let mut view = session.subscribe();

        session.submit("Core").await.unwrap();
        gate.next_prompt().await;

        assert_eq!(session.submit("Lower body").await, Err(SubmitError::Busy));
        assert_eq!(session.submit("   ").await, Err(SubmitError::EmptyPrompt));

        gate.fail();
        let done = view.wait_for(|v| !v.pending).await.unwrap();
        assert_eq!(
            texts(&done),
            vec![
                (Origin::User, "Core".to_string()),
                (Origin::Assistant, FALLBACK_REPLY.to_string()),
            ]
        );

        // Idle again, so the next submission starts a turn
        assert_eq!(session.submit("Lower body").await, Ok(Accepted::Started));
        session.close().await;
    }

    #[tokio::test]
    async fn test_queue_policy_keeps_submission_order() {
        let (dispatcher, mut gate) = gated();
        let session = spawn(dispatcher, SubmitPolicy::Queue);
        let mut view = session.subscribe();

        assert_eq!(session.submit("Core").await, Ok(Accepted::Started));
        assert_eq!(
            session.select(QuickIntent::UpperBody).await,
            Ok(Accepted::Queued { position: 1 })
        );
        assert_eq!(
            session.submit("Lower body").await,
            Ok(Accepted::Queued { position: 2 })
        );

        // Queued prompts are not shown until their turn starts
        assert_eq!(view.current().messages.len(), 1);

        for (prompt, reply) in [
            ("Core", "Planks."),
            ("Upper body", "Push-ups."),
            ("Lower body", "Squats."),
        ] {
            assert_eq!(gate.next_prompt().await, prompt);
            gate.reply(reply);
        }

        let done = view
            .wait_for(|v| !v.pending && v.messages.len() == 6)
            .await
            .unwrap();
        assert_eq!(
            texts(&done),
            vec![
                (Origin::User, "Core".to_string()),
                (Origin::Assistant, "Planks.".to_string()),
                (Origin::User, "Upper body".to_string()),
                (Origin::Assistant, "Push-ups.".to_string()),
                (Origin::User, "Lower body".to_string()),
                (Origin::Assistant, "Squats.".to_string()),
            ]
        );

        session.close().await;
    }

    #[tokio::test]
    async fn test_queue_is_bounded() {
        let (dispatcher, mut gate) = gated();
        let session = spawn(dispatcher, SubmitPolicy::Queue);

        session.submit("Core").await.unwrap();
        gate.next_prompt().await;

        for position in 1..=MAX_QUEUED_PROMPTS {
            assert_eq!(
                session.submit(format!("set {}", position)).await,
                Ok(Accepted::Queued { position })
            );
        }
        assert_eq!(session.submit("one more").await, Err(SubmitError::Busy));

        session.close().await;
    }

    #[tokio::test]
    async fn test_close_when_idle_drains_queue() {
        let (dispatcher, mut gate) = gated();
        let session = spawn(dispatcher, SubmitPolicy::Queue);
        let view = session.subscribe();

        session.submit("Core").await.unwrap();
        session.submit("Lower body").await.unwrap();

        let closing = tokio::spawn(session.close_when_idle());
        assert_eq!(gate.next_prompt().await, "Core");
        gate.reply("Planks.");
        assert_eq!(gate.next_prompt().await, "Lower body");
        gate.reply("Squats.");
        closing.await.unwrap();

        let last = view.current();
        assert!(!last.pending);
        assert_eq!(last.messages.len(), 4);
    }

    #[tokio::test]
    async fn test_draft_submission() {
        let (dispatcher, mut gate) = gated();
        let session = spawn(dispatcher, SubmitPolicy::Reject);
        let mut view = session.subscribe();

        session.set_draft("  Upper body ").await.unwrap();
        assert_eq!(session.submit_draft().await, Ok(Accepted::Started));
        assert_eq!(gate.next_prompt().await, "Upper body");

        gate.reply("Push-ups.");
        view.wait_for(|v| !v.pending).await.unwrap();

        // The draft was consumed, so submitting it again is a no-op
        assert_eq!(session.submit_draft().await, Err(SubmitError::EmptyPrompt));
        session.close().await;
    }

    #[tokio::test]
    async fn test_late_reply_after_teardown_is_discarded() {
        let (dispatcher, mut gate) = gated();
        let session = spawn(Arc::clone(&dispatcher), SubmitPolicy::Reject);
        let old_view = session.subscribe();

        session.submit("Core").await.unwrap();
        gate.next_prompt().await;
        session.close().await;

        // The reply resolves only after the session is gone
        gate.reply("Planks.");

        let fresh = spawn(dispatcher, SubmitPolicy::Reject);
        let fresh_view = fresh.subscribe();
        tokio::task::yield_now().await;

        assert!(fresh_view.current().messages.is_empty());
        assert!(!fresh_view.current().pending);

        let last_seen = old_view.current();
        assert_eq!(texts(&last_seen), vec![(Origin::User, "Core".to_string())]);

        fresh.close().await;
    }

    #[tokio::test]
    async fn test_view_ends_when_session_closes() {
        let (dispatcher, _gate) = gated();
        let session = spawn(dispatcher, SubmitPolicy::Reject);
        let mut view = session.subscribe();
        session.close().await;

        assert!(view.changed().await.is_none());
    }
}
