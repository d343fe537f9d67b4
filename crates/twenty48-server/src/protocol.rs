//! WebSocket protocol messages for the 2048 server.

use serde::{Deserialize, Serialize};
use twenty48_core::BotDifficulty;
use uuid::Uuid;

use crate::leaderboard::LeaderboardEntry;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Start (or restart) a game, optionally seeded
    NewGame { seed: Option<u64> },

    /// Slide tiles; accepts "left" or browser key names like "ArrowLeft"
    Move { direction: String },

    /// Record the finished game on the leaderboard
    SubmitScore { name: Option<String> },

    /// Request the top leaderboard entries
    GetLeaderboard,

    /// Ask for a suggested move
    Hint { difficulty: BotDifficulty },

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned session ID
    Welcome { session_id: Uuid },

    /// Full game snapshot
    GameState { state: serde_json::Value },

    /// Outcome of a move
    MoveResult {
        changed: bool,
        events: Vec<serde_json::Value>,
        error: Option<String>,
    },

    /// No moves remain
    GameOver { score: u64, highest_tile: u32 },

    /// Score saved to the leaderboard
    ScoreRecorded { entry: LeaderboardEntry },

    /// Top leaderboard entries, best first
    Leaderboard { entries: Vec<LeaderboardEntry> },

    /// Suggested move, or none when the game is over
    Hint { direction: Option<String> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}
