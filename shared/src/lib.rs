use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Events sent from a client to the server, as JSON text frames shaped
/// `{"event": "...", "data": {...}}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Register or resume a player under a display name.
    Register { name: String },
    /// Submit an answer for the player bound to this connection.
    Answer { choice: String },
}

/// Events sent from the server to clients, same envelope as [`ClientEvent`].
///
/// `Message`, `Score` and `Question` are unicast to one connection;
/// `LeaderboardUpdate` is broadcast to every connection as a full
/// replacement snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Message { msg: String },
    Score { score: i64 },
    Question(Question),
    LeaderboardUpdate(Vec<LeaderboardEntry>),
}

/// One trivia question: a prompt, the choice tokens a player may answer
/// with, and the point value each token is worth. Tokens absent from the
/// point table score 0.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Question {
    pub prompt: String,
    pub choices: Vec<String>,
    pub points: HashMap<String, i64>,
}

impl Question {
    /// Point value of a choice token; unknown tokens are worth 0.
    pub fn points_for(&self, choice: &str) -> i64 {
        self.points.get(choice).copied().unwrap_or(0)
    }
}

/// One row of the ranked leaderboard snapshot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: i64,
}
