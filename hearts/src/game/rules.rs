//! Play legality and trick resolution.
//!
//! Every node runs the exact same rules over the exact same broadcast plays,
//! which is what lets trick winners be computed locally with no extra round
//! trips.

use super::entities::{
    Card, PlayerIndex, Points, QUEEN_OF_SPADES, Suit, TWO_OF_CLUBS, Trick,
};

/// Whether `card` carries penalty points (any heart, or the queen of spades).
fn is_penalty(card: Card) -> bool {
    card.suit() == Suit::Heart || card == QUEEN_OF_SPADES
}

/// Whether playing `card` from `hand` is legal given the table so far.
///
/// Precedence:
/// 1. The very first play of a hand must be the two of clubs.
/// 2. Within the first trick, hearts and the queen of spades are illegal
///    unless the hand holds no compliant alternative of the led suit.
/// 3. Leading a later trick with a heart requires hearts to be broken,
///    unless the hand is all hearts.
/// 4. Otherwise the led suit must be followed when possible; a void hand
///    may discard anything.
#[must_use]
pub fn is_legal_play(
    card: Card,
    table: &Trick,
    hand: &[Card],
    hearts_broken: bool,
    first_trick: bool,
) -> bool {
    if first_trick && table.is_empty() {
        return card == TWO_OF_CLUBS;
    }

    if first_trick && is_penalty(card) {
        // Penalty cards only become legal on the opening trick when no
        // safe card of the led suit exists.
        let Some(led) = table.led_suit() else {
            return false;
        };
        return !hand
            .iter()
            .any(|held| !is_penalty(*held) && held.suit() == led);
    }

    match table.led_suit() {
        None => {
            // Leading a fresh trick. Hearts stay down until broken, unless
            // the hand consists entirely of hearts.
            if card.suit() == Suit::Heart && !hearts_broken {
                return hand.iter().all(|held| held.suit() == Suit::Heart);
            }
            true
        }
        Some(led) => {
            if hand.iter().any(|held| held.suit() == led) {
                card.suit() == led
            } else {
                // Void in the led suit: anything goes. This is also the
                // escape hatch for dumping the queen or a heart.
                true
            }
        }
    }
}

/// All cards in `hand` that are legal to play right now.
#[must_use]
pub fn legal_plays(
    hand: &[Card],
    table: &Trick,
    hearts_broken: bool,
    first_trick: bool,
) -> Vec<Card> {
    hand.iter()
        .copied()
        .filter(|card| is_legal_play(*card, table, hand, hearts_broken, first_trick))
        .collect()
}

/// The player whose card has the highest value among cards matching the led
/// suit. Cards of other suits cannot win regardless of value. `None` for an
/// empty trick.
#[must_use]
pub fn trick_winner(trick: &Trick) -> Option<PlayerIndex> {
    let led = trick.led_suit()?;
    trick
        .entries()
        .iter()
        .filter(|entry| entry.card.suit() == led)
        .max_by_key(|entry| entry.card.value())
        .map(|entry| entry.player)
}

/// Sum of penalty points over all cards on the table.
#[must_use]
pub fn trick_points(trick: &Trick) -> Points {
    trick
        .entries()
        .iter()
        .map(|entry| entry.card.points())
        .sum()
}

/// Winner and penalty points of a trick. Deterministic: ties are impossible
/// since values are unique per suit within a 52-card deck.
#[must_use]
pub fn resolve_trick(trick: &Trick) -> Option<(PlayerIndex, Points)> {
    Some((trick_winner(trick)?, trick_points(trick)))
}
