//! # Trivia Session Server Library
//!
//! This library implements the server side of a live multi-client trivia
//! session. Clients connect over WebSocket, register a display name,
//! receive questions one at a time, submit answers, and watch a
//! continuously updated leaderboard that is re-broadcast to every
//! connection after each state change.
//!
//! ## Core Responsibilities
//!
//! ### Player State Authority
//! The server is the sole owner of player state. Scores and question
//! cursors live in the [`registry::PlayerRegistry`], and every mutation
//! funnels through its atomic accessors: no component reads or writes a
//! player record outside the registry's lock.
//!
//! ### Session Orchestration
//! The [`session::SessionController`] drives a small per-connection state
//! machine (`Unregistered` to `Registered`) and translates inbound events
//! into registry operations and outbound traffic: unicast acknowledgments
//! and questions to the originating connection, leaderboard broadcasts to
//! everyone.
//!
//! ### Broadcast Consistency
//! Every registration, answer and disconnect ends with a fresh ranked
//! snapshot sent to all connections, so all clients converge on the same
//! leaderboard view as events interleave.
//!
//! ## Architecture Design
//!
//! ### One Task Per Connection
//! Each WebSocket connection gets a reader loop (events for one connection
//! are handled strictly in delivery order) and a writer task draining an
//! unbounded outbound queue. Handlers for different connections run
//! concurrently; the registry's internal lock is the only serialization
//! point, which is exactly the atomicity the scoring contract needs.
//!
//! ### Non-Blocking Sends
//! Outbound sends enqueue and return. A slow or stalled client backs up
//! its own queue without ever stalling scoring or broadcasts for other
//! players.
//!
//! ## Module Organization
//!
//! - [`questions`]: load-once question set with modulo rotation and the
//!   fatal startup error taxonomy.
//! - [`registry`]: the synchronized name-to-player map; registration,
//!   atomic answer scoring, reverse connection lookup, snapshots.
//! - [`leaderboard`]: pure stable ranking of registry snapshots.
//! - [`session`]: per-connection protocol state machine and event
//!   handlers.
//! - [`network`]: WebSocket accept loop, frame parsing, connection
//!   roster, unicast and broadcast primitives.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use server::questions::QuestionSet;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let questions = Arc::new(QuestionSet::load("questions.json")?);
//!
//!     // Port 0 picks a free port; read it back with local_addr().
//!     let server = Server::bind("127.0.0.1:0", questions).await?;
//!     println!("listening on {}", server.local_addr()?);
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod leaderboard;
pub mod network;
pub mod questions;
pub mod registry;
pub mod session;
