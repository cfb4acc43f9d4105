//! # Game Hall Server
//!
//! Authoritative server for turn-based board and card games played in rooms.
//! Clients connect over UDP, create or join a room, and from then on every
//! move is validated here against the rules of the room's game before it is
//! broadcast to the other seats.
//!
//! ## Module Organization
//!
//! ### Sessions (`session`)
//! One [`session::GameSession`] per room. It owns the seats, the board, the
//! move history, and the lifecycle from forming through side choice (and
//! deployment, for military chess) to the end of the game. Undo and draw
//! requests are negotiated here and expire after a configurable time.
//!
//! ### Registry and Router (`registry`, `router`)
//! The registry maps room ids to sessions behind per-room locks. The router
//! resolves each [`shared::Command`] to a session operation and turns
//! rejections into error events for the requester.
//!
//! ### Network (`network`, `client_manager`)
//! The UDP front end: handshake, heartbeats, client timeouts, and delivery
//! of events to the addresses of their recipients.
//!
//! ### Configuration and Errors (`config`, `error`)
//! Command-line settings for the bind address, connection limit, timeouts,
//! and room id allocation. Every rejected operation is a
//! [`error::RoomError`], which maps onto a wire-level error code.
//!
//! ## Event Loop
//!
//! Background tasks receive datagrams, send queued replies, and sweep silent
//! clients. Everything else happens on the main loop, one packet at a time:
//! commands are routed to their room, and a periodic tick cancels undo and
//! draw requests nobody answered in time. Room state is still kept behind
//! locks so the router can be driven from tests without the network.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(ServerConfig::default()).await?;
//!     server.run().await
//! }
//! ```
//!
//! Game rules live in the `shared` crate so that clients can run the same
//! checks locally before sending a move.

pub mod client_manager;
pub mod config;
pub mod error;
pub mod network;
pub mod registry;
pub mod router;
pub mod session;
