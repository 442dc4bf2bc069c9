//! Session controller: the per-connection protocol state machine
//!
//! The transport layer delivers inbound events here in per-connection
//! order; handlers for different connections run concurrently. Each handler
//! mutates player state through the registry, then emits the resulting
//! view: unicasts to the originating connection, plus a leaderboard
//! broadcast to everyone after every state change.

use crate::leaderboard;
use crate::network::ConnectionRegistry;
use crate::questions::QuestionSet;
use crate::registry::{ConnectionId, PlayerRegistry};
use log::{debug, info, warn};
use shared::{ClientEvent, ServerEvent};
use std::sync::Arc;

/// Protocol state of one connection. Owned by that connection's reader
/// task, so single-connection events are handled strictly in order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Unregistered,
    Registered { name: String },
}

/// Orchestrates the question set, player registry and connection registry
/// in response to transport events.
pub struct SessionController {
    registry: Arc<PlayerRegistry>,
    questions: Arc<QuestionSet>,
    connections: Arc<ConnectionRegistry>,
}

impl SessionController {
    pub fn new(
        registry: Arc<PlayerRegistry>,
        questions: Arc<QuestionSet>,
        connections: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            registry,
            questions,
            connections,
        }
    }

    /// A new connection arrived. No player-visible effect until it
    /// registers.
    pub fn handle_connect(&self, conn: ConnectionId) -> ConnectionState {
        info!("New connection: {}", conn);
        ConnectionState::default()
    }

    /// Dispatches one inbound event for `conn`.
    pub async fn handle_event(
        &self,
        conn: ConnectionId,
        state: &mut ConnectionState,
        event: ClientEvent,
    ) {
        match event {
            ClientEvent::Register { name } => self.handle_register(conn, state, name).await,
            ClientEvent::Answer { choice } => self.handle_answer(conn, state, &choice).await,
        }
    }

    /// Registers or resumes `name` and binds it to this connection, then
    /// sends the welcome, the current score and the question at the
    /// player's cursor, and broadcasts a fresh leaderboard.
    async fn handle_register(
        &self,
        conn: ConnectionId,
        state: &mut ConnectionState,
        name: String,
    ) {
        let snapshot = self.registry.register_or_resume(&name, conn).await;

        self.connections
            .emit_to(
                conn,
                &ServerEvent::Message {
                    msg: format!("Welcome, {}! Score: {}", name, snapshot.score),
                },
            )
            .await;
        self.connections
            .emit_to(
                conn,
                &ServerEvent::Score {
                    score: snapshot.score,
                },
            )
            .await;
        self.connections
            .emit_to(
                conn,
                &ServerEvent::Question(self.questions.get(snapshot.cursor).clone()),
            )
            .await;

        *state = ConnectionState::Registered { name };
        self.broadcast_leaderboard().await;
    }

    /// Scores one answer for the bound player and sends the points awarded,
    /// the new total and the next question, then broadcasts the
    /// leaderboard. Answers from unregistered connections are dropped
    /// without an error: there is no bound name to score against.
    async fn handle_answer(&self, conn: ConnectionId, state: &ConnectionState, choice: &str) {
        let name = match state {
            ConnectionState::Registered { name } => name.clone(),
            ConnectionState::Unregistered => {
                debug!("Dropping answer from unregistered connection {}", conn);
                return;
            }
        };

        let outcome = match self.registry.record_answer(&name, choice).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("Ignoring answer on connection {}: {}", conn, err);
                return;
            }
        };

        self.connections
            .emit_to(
                conn,
                &ServerEvent::Message {
                    msg: format!("You got {} points!", outcome.points_awarded),
                },
            )
            .await;
        self.connections
            .emit_to(
                conn,
                &ServerEvent::Score {
                    score: outcome.score,
                },
            )
            .await;
        self.connections
            .emit_to(
                conn,
                &ServerEvent::Question(self.questions.get(outcome.cursor).clone()),
            )
            .await;

        self.broadcast_leaderboard().await;
    }

    /// The connection is gone: release its player association (progress is
    /// kept for a later re-registration) and tell everyone, since the set
    /// of addressable connections changed.
    pub async fn handle_disconnect(&self, conn: ConnectionId, state: &mut ConnectionState) {
        self.registry.mark_disconnected(conn).await;
        *state = ConnectionState::Unregistered;
        self.broadcast_leaderboard().await;
    }

    /// Recomputes the ranked snapshot from the registry and broadcasts it
    /// as a full replacement to every connection.
    async fn broadcast_leaderboard(&self) {
        let entries = self.registry.snapshot_all().await;
        let ranked = leaderboard::rank(entries);
        self.connections
            .broadcast(&ServerEvent::LeaderboardUpdate(ranked))
            .await;
    }
}
