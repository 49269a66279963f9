//! The chat transcript of one user session.

use serde::{Deserialize, Serialize};

/// Greeting every conversation starts with.
pub const DEFAULT_GREETING: &str = "How can I help you?";

/// Who authored a [`Turn`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting.
    User,
    /// The agent (answers, errors and the greeting).
    Assistant,
}

/// One message of the transcript. Turns never change once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    /// Creates a user turn.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Returns the author.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Whether anything happened since the last reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    /// Only the seed turn is present.
    Fresh,
    /// At least one turn follows the seed.
    Active,
}

/// An ordered transcript that always holds at least its seed turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    /// Creates a conversation holding only `seed`.
    #[inline]
    pub fn new(seed: Turn) -> Self {
        Self { turns: vec![seed] }
    }

    /// The seed turn of a default conversation.
    #[inline]
    pub fn default_seed() -> Turn {
        Turn::assistant(DEFAULT_GREETING)
    }

    /// Appends a turn.
    #[inline]
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Drops every turn and starts over from `seed`.
    pub fn reset(&mut self, seed: Turn) {
        self.turns.clear();
        self.turns.push(seed);
    }

    /// Returns the turns, oldest first.
    #[inline]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Returns the number of turns (never zero).
    #[inline]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always `false`, a conversation keeps its seed turn.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the newest turn.
    #[inline]
    pub fn last(&self) -> &Turn {
        // `turns` is never empty.
        &self.turns[self.turns.len() - 1]
    }

    /// Returns the current state.
    #[inline]
    pub fn state(&self) -> ConversationState {
        if self.turns.len() > 1 {
            ConversationState::Active
        } else {
            ConversationState::Fresh
        }
    }
}

impl Default for Conversation {
    #[inline]
    fn default() -> Self {
        Self::new(Self::default_seed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_state() {
        let mut conversation = Conversation::default();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.state(), ConversationState::Fresh);
        assert_eq!(conversation.last(), &Turn::assistant("How can I help you?"));

        conversation.push(Turn::user("How many orders last month?"));
        assert_eq!(conversation.state(), ConversationState::Active);
        conversation.push(Turn::assistant("42 orders."));
        assert_eq!(
            conversation.turns(),
            [
                Turn::assistant("How can I help you?"),
                Turn::user("How many orders last month?"),
                Turn::assistant("42 orders."),
            ]
        );
    }

    #[test]
    fn test_reset() {
        let mut conversation = Conversation::default();
        conversation.push(Turn::user("a"));
        conversation.push(Turn::assistant("b"));
        conversation.reset(Conversation::default_seed());
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.last().role(), Role::Assistant);
        assert_eq!(conversation.last().content(), DEFAULT_GREETING);
        assert_eq!(conversation.state(), ConversationState::Fresh);

        // Resetting a fresh conversation is harmless.
        conversation.reset(Conversation::default_seed());
        assert_eq!(conversation, Conversation::default());
    }

    #[test]
    fn test_turn_serialization() {
        let json = serde_json::to_value(Turn::user("hi")).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "user", "content": "hi" }));
    }
}
