//! The conversation replayed to the suggestion provider on every call.
use crate::openai::{Message, Role};

/// Append-only message history.
#[derive(Clone, Debug, Default)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn push_user(&mut self, content: &str) {
        self.push(Message::new(Role::User, content))
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.push(Message::new(Role::Assistant, content))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }

    /// A provider may only be called when the latest turn is the user's.
    pub fn awaits_reply(&self) -> bool {
        matches!(self.last(), Some(m) if m.role == Role::User)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }
}
