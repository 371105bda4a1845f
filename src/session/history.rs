use super::message::Message;

/// Ordered, append-only record of one session's turns
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    entries: Vec<Message>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message at the end
    pub fn append(&mut self, message: Message) {
        self.entries.push(message);
    }

    /// Every message so far, oldest first
    pub fn snapshot(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.entries.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{Prompt, Reply};
    use crate::session::Origin;

    #[test]
    fn test_append_keeps_arrival_order() {
        let mut history = ConversationHistory::new();
        assert!(history.is_empty());

        history.append(Message::from_prompt(&Prompt::parse("Core").unwrap()));
        history.append(Message::from_reply(&Reply::parse("Planks.").unwrap()));
        history.append(Message::from_prompt(&Prompt::parse("More?").unwrap()));

        let texts: Vec<_> = history.iter().map(|m| m.text()).collect();
        assert_eq!(texts, ["Core", "Planks.", "More?"]);
        assert_eq!(history.len(), 3);
        assert_eq!(history.last().map(|m| m.origin()), Some(Origin::User));
    }

    #[test]
    fn test_earlier_snapshot_is_prefix() {
        let mut history = ConversationHistory::new();
        history.append(Message::from_prompt(&Prompt::parse("Core").unwrap()));
        let before: Vec<Message> = history.snapshot().to_vec();

        history.append(Message::fallback());
        let after = history.snapshot();

        assert!(after.len() > before.len());
        assert!(before.iter().zip(after).all(|(a, b)| a.same_content(b)
            && a.created_at() == b.created_at()));
    }
}
