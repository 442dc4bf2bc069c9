//! Player registry and scoring state for the trivia session
//!
//! This module is the single synchronization boundary for player state:
//! - Player lifecycle (first registration, resume, disconnect)
//! - Score accumulation and question-cursor rotation
//! - Connection-handle tracking and reverse lookup
//!
//! Every read and write of a player's mutable fields goes through one of the
//! registry's accessors, each of which holds the internal lock for the whole
//! operation. That makes answer scoring indivisible: no interleaving of
//! concurrent submissions can lose an update or observe a score/cursor pair
//! that never existed.

use crate::questions::QuestionSet;
use log::{info, warn};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Opaque identifier for one live transport-layer connection, stable for
/// its duration. Allocated by the transport layer.
pub type ConnectionId = u64;

/// An answer or lookup referenced a name that was never registered.
///
/// Recovered locally by the caller (the event is dropped); never surfaced
/// to other clients.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown player: {0}")]
pub struct UnknownPlayerError(pub String);

/// Mutable per-player state. Lives only inside the registry; callers see
/// immutable [`PlayerSnapshot`]s.
#[derive(Debug)]
struct Player {
    /// Accumulated score. Point values may be zero or negative, so this is
    /// not clamped.
    score: i64,
    /// Index of the question this player will see next, always in
    /// `[0, questions.len())`.
    cursor: usize,
    /// The currently associated connection, `None` while disconnected.
    connection: Option<ConnectionId>,
    /// Registration sequence number; fixes the registry's enumeration order
    /// so leaderboard tie-breaks are deterministic.
    joined: u64,
}

/// Immutable point-in-time copy of a player's score and cursor.
///
/// Taken atomically at the point of mutation; a concurrent event may
/// advance the live state immediately after the call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub score: i64,
    pub cursor: usize,
}

/// Result of one atomic answer application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerOutcome {
    /// Points this submission was worth (0 for an unknown choice token).
    pub points_awarded: i64,
    /// The player's total after applying this submission.
    pub score: i64,
    /// The post-advance cursor, wrapped modulo the question count.
    pub cursor: usize,
}

#[derive(Debug, Default)]
struct Inner {
    players: HashMap<String, Player>,
    joined_counter: u64,
}

/// Exclusive owner of the name → player mapping.
///
/// The registry holds the question set so that answer scoring (resolve the
/// choice against the question at the player's cursor, add the points,
/// advance the cursor) happens under a single lock acquisition. Handing the
/// question to callers first would let the cursor move between lookup and
/// application.
pub struct PlayerRegistry {
    inner: RwLock<Inner>,
    questions: Arc<QuestionSet>,
}

impl PlayerRegistry {
    pub fn new(questions: Arc<QuestionSet>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            questions,
        }
    }

    /// Registers a new player or resumes an existing one.
    ///
    /// An unseen name gets a fresh player (score 0, cursor 0) bound to
    /// `conn`. A known name keeps its score and cursor and has its
    /// connection handle replaced with `conn`: last register wins, and the
    /// earlier connection's association is silently orphaned.
    pub async fn register_or_resume(&self, name: &str, conn: ConnectionId) -> PlayerSnapshot {
        let mut guard = self.inner.write().await;
        let Inner {
            players,
            joined_counter,
        } = &mut *guard;

        match players.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                let player = entry.get_mut();
                if let Some(old) = player.connection {
                    if old != conn {
                        warn!(
                            "Player \"{}\" re-registered from connection {} while connection {} was still bound",
                            name, conn, old
                        );
                    }
                }
                player.connection = Some(conn);
                info!("Player \"{}\" resumed on connection {}", name, conn);
                PlayerSnapshot {
                    score: player.score,
                    cursor: player.cursor,
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(Player {
                    score: 0,
                    cursor: 0,
                    connection: Some(conn),
                    joined: *joined_counter,
                });
                *joined_counter += 1;
                info!("Registered player \"{}\" on connection {}", name, conn);
                PlayerSnapshot { score: 0, cursor: 0 }
            }
        }
    }

    /// Reverse lookup: which player, if any, is currently bound to `conn`.
    ///
    /// Atomic with concurrent registration and disconnection: the returned
    /// association existed at some instant during the call.
    pub async fn lookup_by_connection(
        &self,
        conn: ConnectionId,
    ) -> Option<(String, PlayerSnapshot)> {
        let guard = self.inner.read().await;
        guard
            .players
            .iter()
            .find(|(_, player)| player.connection == Some(conn))
            .map(|(name, player)| {
                (
                    name.clone(),
                    PlayerSnapshot {
                        score: player.score,
                        cursor: player.cursor,
                    },
                )
            })
    }

    /// Applies one answer submission as a single atomic step.
    ///
    /// Resolves `choice` against the question at the player's current
    /// cursor (tokens absent from the point table score 0), adds the points
    /// to the score, and advances the cursor by one position modulo the
    /// question count. Concurrent submissions for the same name serialize
    /// on the registry lock; each is applied exactly once.
    pub async fn record_answer(
        &self,
        name: &str,
        choice: &str,
    ) -> Result<AnswerOutcome, UnknownPlayerError> {
        let mut guard = self.inner.write().await;
        let player = guard
            .players
            .get_mut(name)
            .ok_or_else(|| UnknownPlayerError(name.to_string()))?;

        let question = self.questions.get(player.cursor);
        let points_awarded = question.points_for(choice);
        player.score += points_awarded;
        player.cursor = (player.cursor + 1) % self.questions.len();

        Ok(AnswerOutcome {
            points_awarded,
            score: player.score,
            cursor: player.cursor,
        })
    }

    /// Clears the connection handle of whichever player currently holds
    /// `conn`; no-op when none does.
    ///
    /// Score and cursor are preserved; disconnection is not deletion. If
    /// the player has since re-registered from a newer connection, the
    /// newer handle is left untouched.
    pub async fn mark_disconnected(&self, conn: ConnectionId) {
        let mut guard = self.inner.write().await;
        if let Some((name, player)) = guard
            .players
            .iter_mut()
            .find(|(_, player)| player.connection == Some(conn))
        {
            player.connection = None;
            info!("Player \"{}\" disconnected (connection {})", name, conn);
        }
    }

    /// Consistent point-in-time enumeration of `(name, score)` pairs for
    /// leaderboard rendering, in registration order.
    ///
    /// The whole enumeration happens under one lock acquisition, so a
    /// torn record (old score with a new name) can never appear.
    pub async fn snapshot_all(&self) -> Vec<(String, i64)> {
        let guard = self.inner.read().await;
        let mut entries: Vec<(u64, String, i64)> = guard
            .players
            .iter()
            .map(|(name, player)| (player.joined, name.clone(), player.score))
            .collect();
        entries.sort_by_key(|(joined, _, _)| *joined);
        entries
            .into_iter()
            .map(|(_, name, score)| (name, score))
            .collect()
    }

    /// Number of registered players (connected or not).
    pub async fn len(&self) -> usize {
        self.inner.read().await.players.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.players.is_empty()
    }
}
