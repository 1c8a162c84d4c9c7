//! Rendering surface abstraction
//!
//! This module defines the seam between the session logic and whatever
//! renders it. The state machine never touches a rendering surface
//! directly; it emits typed [`UpdateMessage`]s through the [`Surface`]
//! trait, which a DOM, TUI, or test double can implement.

use serde::Serialize;

use crate::{leaderboard::LeaderboardEntry, transcript::ChatTurn};

/// Messages sent to update the rendered view
///
/// Each variant corresponds to one region of the interface. Messages are
/// serializable so a surface living across a process or WASM boundary can
/// forward them verbatim.
#[derive(Debug, Clone, Serialize, derive_more::From)]
pub enum UpdateMessage {
    /// Append a turn to the chat transcript
    Turn(ChatTurn),
    /// Render clickable option buttons for the active question
    OptionButtons(Vec<String>),
    /// Disable all answer controls (an answer is in flight)
    OptionsDisabled,
    /// Replace the rendered leaderboard with a fresh server sequence
    Leaderboard(Vec<LeaderboardEntry>),
    /// The leaderboard fetch failed; distinct from an empty board
    LeaderboardUnavailable,
    /// Show an inline auth/validation banner; surfaces auto-dismiss it
    /// after [`crate::constants::timing::BANNER_DISMISS_MS`]
    ///
    /// Constructed explicitly, so the `String` conversion stays
    /// reserved for [`UpdateMessage::SignedIn`].
    #[from(ignore)]
    AuthBanner(String),
    /// Switch to the signed-in view
    SignedIn {
        /// Label to show for the current user
        display_name: String,
    },
    /// Switch to the signed-out view
    SignedOut,
}

/// Trait for delivering view updates to a rendering surface
///
/// Implementations might append to a DOM, redraw a terminal, or collect
/// messages for assertions in tests. Delivery is fire-and-forget: the
/// session logic never depends on a surface acknowledging anything.
pub trait Surface {
    /// Delivers one view update
    fn send_update(&self, message: &UpdateMessage);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_message_from_turn() {
        let message: UpdateMessage = ChatTurn::bot("hello").into();
        assert!(matches!(message, UpdateMessage::Turn(_)));
    }

    #[test]
    fn test_string_converts_to_signed_in_label() {
        let message: UpdateMessage = "alice".to_string().into();
        assert!(matches!(
            message,
            UpdateMessage::SignedIn { ref display_name } if display_name == "alice"
        ));
    }

    #[test]
    fn test_update_message_serializes() {
        let message = UpdateMessage::OptionButtons(vec!["S3".to_string(), "EBS".to_string()]);
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("OptionButtons"));
        assert!(json.contains("S3"));
    }
}
