//! Hearts game engine - card model, rules, and replicated state.
//!
//! This module provides the deterministic core every node runs identically:
//! - Card and deck entities with value-based identity
//! - Play legality and trick resolution
//! - The per-node replicated game state and hand lifecycle

pub mod entities;
pub mod rules;
pub mod state;

pub use state::{GameState, HandPhase, PlayError, SCORE_LIMIT};
