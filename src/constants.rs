//! Configuration constants for the quizchat client
//!
//! This module contains the fixed parameters of the quiz flow and the
//! authentication adapter. They are compile-time constants because the
//! backend contract (quiz length, question id scheme, synthetic account
//! domain) is fixed at deploy time rather than runtime-configurable.

/// Quiz flow constants
pub mod quiz {
    /// Number of questions in a full quiz run
    pub const QUESTION_COUNT: u32 = 10;
    /// Maximum number of options rendered per question; extra options are dropped
    pub const MAX_OPTION_COUNT: usize = 4;
    /// Letters assigned to options by position
    pub const OPTION_LETTERS: [char; 4] = ['A', 'B', 'C', 'D'];
    /// Id of the first question of a quiz
    pub const FIRST_QUESTION_ID: &str = "q1";
    /// Phrase in a chat reply that signals a quiz start (matched case-insensitively)
    pub const START_MARKER: &str = "here is your first question";
}

/// Presentation timing constants
pub mod timing {
    /// Delay before revealing the next question, so feedback stays visible
    pub const NEXT_QUESTION_DELAY_MS: u64 = 1000;
    /// Interval after which inline validation banners auto-dismiss
    pub const BANNER_DISMISS_MS: u64 = 5000;
}

/// Identity adapter constants
pub mod auth {
    /// Minimum password length accepted before any remote call
    pub const MIN_PASSWORD_LENGTH: usize = 6;
    /// Domain suffix appended to the display name to form the synthetic
    /// account identifier. Must stay stable for provider compatibility.
    pub const EMAIL_SUFFIX: &str = "@edubox.com";
    /// Display label for anonymous sessions
    pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous User";
}
