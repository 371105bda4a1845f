use tokio::sync::watch;

use super::message::Message;
use super::state::SessionState;

/// What the rendering layer needs to draw the conversation
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    pub messages: Vec<Message>,
    pub pending: bool,
    /// Bumped on every publish
    pub revision: u64,
}

impl SessionView {
    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Changes a receiver has not seen yet
#[derive(Debug, Clone)]
pub struct ViewUpdate {
    /// Messages appended since this receiver's previous update
    pub new_messages: Vec<Message>,
    pub pending: bool,
    /// Edge trigger: new content arrived, scroll to the newest message
    pub scroll_to_latest: bool,
}

/// Publishing side, owned by the session controller
#[derive(Debug)]
pub struct ViewSync {
    tx: watch::Sender<SessionView>,
}

impl Default for ViewSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewSync {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionView::default());
        Self { tx }
    }

    /// Push the current session state to every receiver
    pub fn publish(&self, state: &SessionState) {
        self.tx.send_modify(|view| {
            let history = state.history().snapshot();
            // History is append-only, so only the tail needs copying
            let shown = view.messages.len();
            if history.len() > shown {
                view.messages.extend_from_slice(&history[shown..]);
            }
            view.pending = state.is_pending();
            view.revision += 1;
        });
    }

    pub fn subscribe(&self) -> ViewReceiver {
        ViewReceiver::new(self.tx.subscribe())
    }
}

/// Rendering side; each receiver tracks what it has already shown
#[derive(Debug, Clone)]
pub struct ViewReceiver {
    rx: watch::Receiver<SessionView>,
    seen: usize,
}

impl ViewReceiver {
    fn new(rx: watch::Receiver<SessionView>) -> Self {
        Self { rx, seen: 0 }
    }

    /// The latest published view
    pub fn current(&self) -> SessionView {
        self.rx.borrow().clone()
    }

    /// Wait for the next publish; `None` once the session is gone
    ///
    /// Several publishes between two calls are coalesced into one update.
    pub async fn changed(&mut self) -> Option<ViewUpdate> {
        self.rx.changed().await.ok()?;

        let view = self.rx.borrow_and_update();
        let new_messages = view.messages[self.seen.min(view.messages.len())..].to_vec();
        self.seen = view.messages.len();

        Some(ViewUpdate {
            scroll_to_latest: !new_messages.is_empty(),
            new_messages,
            pending: view.pending,
        })
    }

    /// Wait until the view satisfies `predicate`; `None` if the session ends first
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&SessionView) -> bool,
    ) -> Option<SessionView> {
        let view = self.rx.wait_for(|view| predicate(view)).await.ok()?;
        Some(view.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Reply;

    #[tokio::test]
    async fn test_update_reports_new_messages_once() {
        let sync = ViewSync::new();
        let mut view = sync.subscribe();
        let mut state = SessionState::new();

        state.begin_turn("Core").unwrap();
        sync.publish(&state);

        let update = view.changed().await.unwrap();
        assert!(update.pending);
        assert!(update.scroll_to_latest);
        assert_eq!(update.new_messages.len(), 1);

        state.complete_turn(Ok(Reply::parse("Planks.").unwrap())).unwrap();
        sync.publish(&state);

        let update = view.changed().await.unwrap();
        assert!(!update.pending);
        assert_eq!(update.new_messages.len(), 1);
        assert_eq!(update.new_messages[0].text(), "Planks.");
    }

    #[tokio::test]
    async fn test_coalesced_publishes() {
        let sync = ViewSync::new();
        let mut view = sync.subscribe();
        let mut state = SessionState::new();

        state.begin_turn("Core").unwrap();
        sync.publish(&state);
        state.complete_turn(Ok(Reply::parse("Planks.").unwrap())).unwrap();
        sync.publish(&state);

        let update = view.changed().await.unwrap();
        assert_eq!(update.new_messages.len(), 2);
        assert!(!update.pending);
        assert_eq!(view.current().revision, 2);
    }

    #[tokio::test]
    async fn test_publish_without_new_messages_does_not_scroll() {
        let sync = ViewSync::new();
        let mut view = sync.subscribe();
        let state = SessionState::new();

        sync.publish(&state);
        let update = view.changed().await.unwrap();
        assert!(!update.scroll_to_latest);
        assert!(update.new_messages.is_empty());
    }

    #[tokio::test]
    async fn test_receiver_ends_with_session() {
        let sync = ViewSync::new();
        let mut view = sync.subscribe();
        drop(sync);
        assert!(view.changed().await.is_none());
    }
}
