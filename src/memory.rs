//! Conversation memory
//!
//! Chronological log of question/answer turns. Every turn is kept until the
//! memory is cleared; only the tail is used to build context for the remote
//! assistant.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Turns prefixed to a remote request
pub const CONTEXT_TURNS: usize = 3;

/// One answered utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        debug!(turns = self.turns.len(), "conversation turn recorded");
    }

    /// The most recent turns, oldest first
    pub fn recent(&self) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(CONTEXT_TURNS);
        &self.turns[start..]
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
