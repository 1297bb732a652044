//! Conversation turns and the per-session transcript.
//!
//! The transcript is append-only between resets. A reset clears the turns
//! and any pending canned prompt in one step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The model's reply
    Assistant,
}

impl Role {
    /// Capitalized name used when rendering chat history.
    pub fn display_name(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A single turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered turns plus the optional pending canned prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    turns: Vec<Turn>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pending_prompt: Option<String>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The most recent turn, if any.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Queue a canned prompt, replacing any prompt already pending.
    pub fn set_pending(&mut self, prompt: impl Into<String>) {
        self.pending_prompt = Some(prompt.into());
    }

    /// Consume the pending prompt.
    pub fn take_pending(&mut self) -> Option<String> {
        self.pending_prompt.take()
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending_prompt.as_deref()
    }

    /// Clear turns and the pending prompt together.
    pub fn reset(&mut self) {
        self.turns.clear();
        self.pending_prompt = None;
    }
}
