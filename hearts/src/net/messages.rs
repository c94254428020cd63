//! Wire message kinds for the ring protocol.
//!
//! Every record travels as JSON tagged by a `type` field. The token is the
//! one exception: an untagged sentinel payload, since it carries no fields
//! at all. Decoding validates record shape whole; a record with a missing
//! or invalid field is rejected rather than partially applied.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::{ProtocolError, Result};
use crate::game::entities::{Card, Hand, NUM_PLAYERS, PlayerIndex, Points};

/// The untagged exclusive-turn grant.
pub const TOKEN_SENTINEL: &str = "TOKEN";

/// The `action` discriminant of a `GAME` record. Only plays exist today;
/// the field stays on the wire for compatibility with the record shape.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GameAction {
    #[serde(rename = "PLAY")]
    Play,
}

/// A peer-addressed or broadcast protocol record.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Bootstrap announcement from a non-host node to the host.
    #[serde(rename = "CONNECT")]
    Connect { player: PlayerIndex },
    /// Host to all: the initial deal.
    #[serde(rename = "START_GAME")]
    StartGame { hands: [Hand; NUM_PLAYERS] },
    /// One play by the token holder.
    #[serde(rename = "GAME")]
    Game {
        action: GameAction,
        card: Card,
        player: PlayerIndex,
    },
    /// Authoritative end-of-trick summary, authored only by the winner.
    #[serde(rename = "END_TRICK")]
    EndTrick {
        winner: PlayerIndex,
        points: Points,
        scores: [Points; NUM_PLAYERS],
    },
    /// Out-of-band score sync. Legacy path; nothing emits it during normal
    /// play but it remains decodable and is adopted on receipt.
    #[serde(rename = "SCORES")]
    Scores { scores: [Points; NUM_PLAYERS] },
    /// Host to all: a subsequent deal.
    #[serde(rename = "NEW_HAND")]
    NewHand { hands: [Hand; NUM_PLAYERS] },
    /// Terminal broadcast carrying the winner and final scores.
    #[serde(rename = "GAME_END")]
    GameEnd {
        winner: PlayerIndex,
        final_scores: [Points; NUM_PLAYERS],
    },
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Connect { player } => format!("CONNECT from player {player}"),
            Self::StartGame { .. } => "START_GAME".to_string(),
            Self::Game { card, player, .. } => format!("player {player} played {card}"),
            Self::EndTrick { winner, points, .. } => {
                format!("END_TRICK won by player {winner} for {points}")
            }
            Self::Scores { scores } => format!("SCORES {scores:?}"),
            Self::NewHand { .. } => "NEW_HAND".to_string(),
            Self::GameEnd { winner, .. } => format!("GAME_END won by player {winner}"),
        };
        write!(f, "{repr}")
    }
}

/// One decoded inbound datagram: the token sentinel, a known record, or a
/// well-formed record of an unrecognized kind (kept explicit for forward
/// compatibility; the coordinator logs and drops it).
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    Token,
    Message(Message),
    Unknown(String),
}

/// Encode a record for the wire.
pub fn encode(message: &Message) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

/// The token's wire payload.
#[must_use]
pub fn token_frame() -> &'static [u8] {
    TOKEN_SENTINEL.as_bytes()
}

/// Decode an inbound datagram payload.
///
/// Malformed payloads are an error; a syntactically valid record whose
/// `type` is unrecognized decodes to [`Inbound::Unknown`] instead so the
/// caller can drop it without treating it as corruption.
pub fn decode(payload: &[u8]) -> Result<Inbound> {
    if payload == token_frame() {
        return Ok(Inbound::Token);
    }
    match serde_json::from_slice::<Message>(payload) {
        Ok(message) => Ok(Inbound::Message(message)),
        Err(err) => {
            let tag = serde_json::from_slice::<serde_json::Value>(payload)
                .ok()
                .and_then(|value| {
                    value
                        .get("type")
                        .and_then(|tag| tag.as_str())
                        .map(str::to_string)
                });
            match tag {
                Some(tag) if !KNOWN_KINDS.contains(&tag.as_str()) => Ok(Inbound::Unknown(tag)),
                _ => Err(ProtocolError::Malformed(err)),
            }
        }
    }
}

const KNOWN_KINDS: [&str; 7] = [
    "CONNECT",
    "START_GAME",
    "GAME",
    "END_TRICK",
    "SCORES",
    "NEW_HAND",
    "GAME_END",
];
