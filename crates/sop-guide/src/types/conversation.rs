//! Caller-owned conversation history

use serde::{Deserialize, Serialize};

use crate::generation::templates::GREETING;

/// Speaker of a turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Speaker name rendered into prompts
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Self::User => "Usuario",
            Self::Assistant => "Asistente",
        }
    }
}

/// One message of a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered conversation history.
///
/// Stored history is capped at `max_turns`; the oldest turns are dropped first.
/// The pipeline only ever reads a window of the most recent turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,
    max_turns: usize,
}

impl Conversation {
    /// Empty conversation retaining at most `max_turns` turns
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: Vec::new(),
            max_turns: max_turns.max(1),
        }
    }

    /// Conversation opened by the assistant's greeting
    pub fn with_greeting(max_turns: usize) -> Self {
        let mut conversation = Self::new(max_turns);
        conversation.push(Turn::assistant(GREETING));
        conversation
    }

    /// Append a turn, evicting the oldest when over capacity
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        if self.turns.len() > self.max_turns {
            let excess = self.turns.len() - self.max_turns;
            self.turns.drain(..excess);
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(Turn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(Turn::assistant(content));
    }

    /// All retained turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// The last `window` turns of `history`, oldest first
pub fn recent_turns(history: &[Turn], window: usize) -> &[Turn] {
    &history[history.len().saturating_sub(window)..]
}
