//! Leaderboard view state
//!
//! The leaderboard is a read-only projection of server state: fetched fresh
//! on demand and replaced wholesale. The server is authoritative for ranking
//! order; the client never re-sorts and never merges a fetch with prior data.

use serde::{Deserialize, Serialize};

/// One ranked row of the shared leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Display name the score was posted under
    pub username: String,
    /// Questions answered correctly
    pub score: u32,
    /// Quiz length the score was achieved against
    pub total: u32,
}

/// The currently rendered leaderboard
///
/// An empty entry list is a valid state (nobody has posted yet) and is
/// distinct from a fetch failure, which leaves the previous entries alone.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    /// Replaces the whole board with a freshly fetched sequence,
    /// preserving the server's order
    pub fn replace(&mut self, entries: Vec<LeaderboardEntry>) {
        self.entries = entries;
    }

    /// Returns the entries in server order
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }
}
