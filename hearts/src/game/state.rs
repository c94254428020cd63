//! The replicated per-node game state and its hand lifecycle.
//!
//! Every node owns exactly one [`GameState`], mutated only through the
//! coordination layer. The state evolves identically on all four nodes
//! because it is driven by the same sequence of broadcast events.

use std::collections::BTreeSet;
use thiserror::Error;

use super::entities::{
    Card, HAND_SIZE, Hand, HOST, NUM_PLAYERS, PlayerIndex, Points, Suit,
    TWO_OF_CLUBS, Trick, TrickEntry,
};

/// A game ends at the first hand boundary where some score reaches this.
pub const SCORE_LIMIT: Points = 100;

/// Errors from a local play attempt. None of these leave the node: the play
/// is rejected synchronously, the token is retained, and the caller
/// re-prompts.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PlayError {
    #[error("the game is over")]
    GameOver,
    #[error("not your turn")]
    OutOfTurn,
    #[error("{0} is not in your hand")]
    NotInHand(Card),
    #[error("{0} is not a legal play")]
    IllegalPlay(Card),
}

/// Progress of a node through the lifecycle of dealt hands.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum HandPhase {
    /// No playable hand yet; waiting on a deal from the host.
    #[default]
    AwaitingDeal,
    /// Playing through the 13 tricks of a hand.
    InHand,
    /// All 13 tricks resolved; scores are at a checkpoint.
    HandComplete,
    /// Terminal. No further plays accepted.
    GameComplete,
}

/// Replicated game state for one node.
///
/// Only this node's own hand is ever present; other hands are never
/// revealed. Scores, the table, and the flags converge across nodes via the
/// broadcast protocol.
#[derive(Clone, Debug, Default)]
pub struct GameState {
    phase: HandPhase,
    hand: Hand,
    trick: Trick,
    tricks_played: usize,
    hearts_broken: bool,
    first_trick: bool,
    scores: [Points; NUM_PLAYERS],
    token_held: bool,
    connected: BTreeSet<PlayerIndex>,
    winner: Option<PlayerIndex>,
}

impl GameState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> HandPhase {
        self.phase
    }

    #[must_use]
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    #[must_use]
    pub fn trick(&self) -> &Trick {
        &self.trick
    }

    /// Trick counter within the current hand, 0..=13.
    #[must_use]
    pub fn tricks_played(&self) -> usize {
        self.tricks_played
    }

    #[must_use]
    pub fn hearts_broken(&self) -> bool {
        self.hearts_broken
    }

    #[must_use]
    pub fn first_trick(&self) -> bool {
        self.first_trick
    }

    #[must_use]
    pub fn scores(&self) -> &[Points; NUM_PLAYERS] {
        &self.scores
    }

    #[must_use]
    pub fn token_held(&self) -> bool {
        self.token_held
    }

    #[must_use]
    pub fn game_over(&self) -> bool {
        self.phase == HandPhase::GameComplete
    }

    #[must_use]
    pub fn winner(&self) -> Option<PlayerIndex> {
        self.winner
    }

    #[must_use]
    pub fn has_two_of_clubs(&self) -> bool {
        self.hand.contains(&TWO_OF_CLUBS)
    }

    pub fn grant_token(&mut self) {
        self.token_held = true;
    }

    pub fn clear_token(&mut self) {
        self.token_held = false;
    }

    /// Host-only bootstrap bookkeeping. Set membership, never a counter, so
    /// a re-announcing player cannot inflate the count. Returns how many
    /// distinct players (host included) have announced.
    pub fn register_connection(&mut self, player: PlayerIndex) -> usize {
        self.connected.insert(player);
        self.connected.insert(HOST);
        self.connected.len()
    }

    #[must_use]
    pub fn all_connected(&self) -> bool {
        self.connected.len() == NUM_PLAYERS
    }

    /// Adopt a freshly dealt hand and reset all hand-scoped state. Valid
    /// from `AwaitingDeal` (bootstrap) and `HandComplete` (redeal); the
    /// table is left alone because trick entries belong to the broadcast
    /// stream, not the deal.
    pub fn adopt_deal(&mut self, hand: Hand) {
        debug_assert_eq!(hand.len(), HAND_SIZE);
        self.hand = hand;
        self.tricks_played = 0;
        self.hearts_broken = false;
        self.first_trick = true;
        self.token_held = false;
        self.phase = HandPhase::InHand;
    }

    /// Remove a card from this node's own hand. Returns false if absent.
    pub fn remove_from_hand(&mut self, card: Card) -> bool {
        match self.hand.iter().position(|held| *held == card) {
            Some(idx) => {
                self.hand.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Append a play to the table. Any heart landing in a trick breaks
    /// hearts on every node, local or remote.
    pub fn record_play(&mut self, entry: TrickEntry) {
        if entry.card.suit() == Suit::Heart {
            self.hearts_broken = true;
        }
        self.trick.push(entry);
    }

    pub fn award(&mut self, winner: PlayerIndex, points: Points) {
        self.scores[winner] += points;
    }

    /// Adopt broadcast scores as ground truth.
    pub fn adopt_scores(&mut self, scores: &[Points; NUM_PLAYERS]) {
        self.scores = *scores;
    }

    /// Advance past a resolved trick: clear the table, bump the counter,
    /// and close the hand after the 13th trick.
    pub fn advance_trick(&mut self) {
        self.trick.clear();
        self.first_trick = false;
        self.tricks_played += 1;
        if self.tricks_played == HAND_SIZE {
            self.phase = HandPhase::HandComplete;
        }
    }

    /// At a hand boundary: the game winner if some score reached the limit.
    /// Ties go to the lowest player index.
    #[must_use]
    pub fn game_result(&self) -> Option<PlayerIndex> {
        let max = self.scores.iter().max().copied().unwrap_or(0);
        if max < SCORE_LIMIT {
            return None;
        }
        self.scores
            .iter()
            .enumerate()
            .min_by_key(|(_, score)| **score)
            .map(|(player, _)| player)
    }

    /// Terminal transition. Once called, no state-mutating message is
    /// processed again.
    pub fn complete_game(&mut self, winner: PlayerIndex) {
        self.phase = HandPhase::GameComplete;
        self.winner = Some(winner);
        self.token_held = false;
    }

    /// Return to `AwaitingDeal` at a hand boundary while the host deals.
    pub fn await_deal(&mut self) {
        self.phase = HandPhase::AwaitingDeal;
        self.token_held = false;
    }
}
