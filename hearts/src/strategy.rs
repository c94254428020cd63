//! A simple automatic player.
//!
//! Used by nodes running unattended: it plays low when it must follow or
//! lead, and unloads penalty cards the moment a void lets it discard.
//! It never takes the hand model anywhere illegal, since it only picks
//! from the legal set.

use crate::game::entities::{Card, QUEEN_OF_SPADES, Suit, Trick};
use crate::game::rules;

/// Pick a card for the current table, or `None` with an empty hand.
#[must_use]
pub fn choose_card(
    hand: &[Card],
    trick: &Trick,
    hearts_broken: bool,
    first_trick: bool,
) -> Option<Card> {
    let legal = rules::legal_plays(hand, trick, hearts_broken, first_trick);
    let Some(led) = trick.led_suit() else {
        // Leading: open low.
        return lowest(&legal);
    };
    if legal.iter().any(|card| card.suit() == led) {
        // Following suit: duck with the lowest.
        return lowest(&legal);
    }
    // Void in the led suit: dump the queen, then the highest heart, then
    // the highest card.
    if legal.contains(&QUEEN_OF_SPADES) {
        return Some(QUEEN_OF_SPADES);
    }
    legal
        .iter()
        .filter(|card| card.suit() == Suit::Heart)
        .max_by_key(|card| card.value())
        .copied()
        .or_else(|| highest(&legal))
}

fn lowest(cards: &[Card]) -> Option<Card> {
    cards.iter().min_by_key(|card| card.value()).copied()
}

fn highest(cards: &[Card]) -> Option<Card> {
    cards.iter().max_by_key(|card| card.value()).copied()
}
