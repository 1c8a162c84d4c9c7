//! Chat transcript model
//!
//! The transcript is the append-only message log shown next to the quiz:
//! timestamped turns from the user and the bot, never mutated or removed
//! once logged. Rendering and scrolling belong to the surface; this module
//! only owns the data.

use serde::{Deserialize, Serialize};
use web_time::SystemTime;

/// Who produced a chat turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// The local user
    User,
    /// The remote assistant (or the client speaking on its behalf,
    /// e.g. for transport-error notices)
    Bot,
}

/// A single timestamped entry in the chat transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who produced this turn
    pub sender: Sender,
    /// The text of the turn
    pub text: String,
    /// When the turn was logged
    pub at: SystemTime,
}

impl ChatTurn {
    /// Creates a user turn stamped with the current time
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
            at: SystemTime::now(),
        }
    }

    /// Creates a bot turn stamped with the current time
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            text: text.into(),
            at: SystemTime::now(),
        }
    }
}

/// Append-only log of chat turns
#[derive(Debug, Default, Clone, Serialize)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    /// Appends a turn to the end of the log
    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    /// Returns all turns in insertion order
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Returns the number of logged turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` if nothing has been logged yet
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_preserves_order() {
        let mut transcript = Transcript::default();
        transcript.push(ChatTurn::user("hello"));
        transcript.push(ChatTurn::bot("hi there"));
        transcript.push(ChatTurn::user("quiz"));

        let texts: Vec<&str> = transcript.turns().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["hello", "hi there", "quiz"]);
        assert_eq!(transcript.len(), 3);
        assert!(!transcript.is_empty());
    }

    #[test]
    fn test_turn_senders() {
        assert_eq!(ChatTurn::user("x").sender, Sender::User);
        assert_eq!(ChatTurn::bot("x").sender, Sender::Bot);
    }
}
