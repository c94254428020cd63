//! A distributed, serverless game of Hearts for exactly four peers.
//!
//! Each node runs the same deterministic game engine and keeps its copy of
//! the shared state current by applying broadcast events. Turn order is
//! enforced by a single token circulating the ring; only the holder may
//! play. [`coordination`] is the brain, [`game`] the rules and replicated
//! state, [`net`] the UDP wire, and [`strategy`] a simple automatic player.

pub mod coordination;
pub mod game;
pub mod net;
pub mod strategy;

pub use coordination::{Coordinator, NodePhase, Outbox, TableView};
pub use game::entities::{Card, HOST, Hand, NUM_PLAYERS, PlayerIndex, Points, Suit, Trick};
pub use game::{GameState, HandPhase, PlayError, SCORE_LIMIT};
pub use net::messages::{Inbound, Message};
