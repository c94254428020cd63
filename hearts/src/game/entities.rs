use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Number of players in a game. The ring protocol is fixed at four nodes.
pub const NUM_PLAYERS: usize = 4;

/// Cards dealt to each player per hand.
pub const HAND_SIZE: usize = 13;

/// Cards in a full deck.
pub const DECK_SIZE: usize = NUM_PLAYERS * HAND_SIZE;

/// Fixed identity of a node for the process lifetime. Index 0 is the host.
pub type PlayerIndex = usize;

/// Index of the host node, the sole dealer and bootstrap coordinator.
pub const HOST: PlayerIndex = 0;

/// Penalty points. Scores only ever grow.
pub type Points = u32;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card values (2=2u8 ... ace=14u8).
pub type Value = u8;

/// Lowest card value in the deck.
pub const MIN_VALUE: Value = 2;

/// Highest card value in the deck (the ace).
pub const MAX_VALUE: Value = 14;

/// A card is a value and a suit. Identity is value-based: two cards with
/// equal value and suit are the same card.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

/// The hard-coded opening card of every hand.
pub const TWO_OF_CLUBS: Card = Card(2, Suit::Club);

/// The 13-point penalty card.
pub const QUEEN_OF_SPADES: Card = Card(12, Suit::Spade);

impl Card {
    #[must_use]
    pub const fn value(self) -> Value {
        self.0
    }

    #[must_use]
    pub const fn suit(self) -> Suit {
        self.1
    }

    /// Penalty points carried by this card: 1 for any heart, 13 for the
    /// queen of spades, 0 otherwise.
    #[must_use]
    pub fn points(self) -> Points {
        if self.suit() == Suit::Heart {
            1
        } else if self == QUEEN_OF_SPADES {
            13
        } else {
            0
        }
    }

    /// Sort key for deterministic display ordering (suit-major, then value).
    #[must_use]
    pub const fn sort_key(self) -> (Suit, Value) {
        (self.1, self.0)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            11 => write!(f, "J{}", self.1),
            12 => write!(f, "Q{}", self.1),
            13 => write!(f, "K{}", self.1),
            14 => write!(f, "A{}", self.1),
            value => write!(f, "{value}{}", self.1),
        }
    }
}

// Cards arrive off the wire, so the value range is validated on decode
// rather than trusted.
impl<'de> Deserialize<'de> for Card {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (value, suit) = <(Value, Suit)>::deserialize(deserializer)?;
        if !(MIN_VALUE..=MAX_VALUE).contains(&value) {
            return Err(serde::de::Error::custom(format!(
                "card value {value} out of range {MIN_VALUE}..={MAX_VALUE}"
            )));
        }
        Ok(Self(value, suit))
    }
}

/// One player's dealt cards. Hands only ever shrink as cards are played.
pub type Hand = Vec<Card>;

/// Copy of a hand sorted for display (suit-major, then value).
#[must_use]
pub fn sorted_for_display(cards: &[Card]) -> Vec<Card> {
    let mut cards = cards.to_vec();
    cards.sort_unstable_by_key(|card| card.sort_key());
    cards
}

/// The 52 distinct cards, exactly one of each value and suit combination.
/// Created once per hand and partitioned into the four hands.
#[derive(Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A uniformly shuffled deck from the process RNG.
    #[must_use]
    pub fn shuffled() -> Self {
        Self::shuffled_with(&mut rand::rng())
    }

    /// A uniformly shuffled deck from the given RNG. Split out so tests can
    /// seed the permutation.
    pub fn shuffled_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards: Vec<Card> = (MIN_VALUE..=MAX_VALUE)
            .flat_map(|value| {
                [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart]
                    .into_iter()
                    .map(move |suit| Card(value, suit))
            })
            .collect();
        cards.shuffle(rng);
        Self { cards }
    }

    /// Partition the deck into four ordered hands of 13 in fixed consecutive
    /// blocks: block `i` is the hand of player `i`.
    #[must_use]
    pub fn deal(self) -> [Hand; NUM_PLAYERS] {
        let mut hands: [Hand; NUM_PLAYERS] = Default::default();
        for (i, chunk) in self.cards.chunks(HAND_SIZE).enumerate() {
            hands[i] = chunk.to_vec();
        }
        hands
    }
}

/// One play within a trick: which card, and who played it.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TrickEntry {
    pub card: Card,
    pub player: PlayerIndex,
}

/// An ordered sequence of up to four plays, insertion order = play order.
/// Upon reaching four entries the trick is resolved and cleared by its
/// owner; the trick itself never grows past four.
#[derive(Clone, Debug, Default)]
pub struct Trick {
    entries: Vec<TrickEntry>,
}

impl Trick {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TrickEntry) {
        debug_assert!(!self.is_complete(), "trick already has four entries");
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[TrickEntry] {
        &self.entries
    }

    /// Cards on the table in play order.
    #[must_use]
    pub fn cards(&self) -> Vec<Card> {
        self.entries.iter().map(|entry| entry.card).collect()
    }

    /// The suit of the first card played, governing follow-suit legality
    /// and trick-winner eligibility.
    #[must_use]
    pub fn led_suit(&self) -> Option<Suit> {
        self.entries.first().map(|entry| entry.card.suit())
    }

    /// Whether the given player already has a card on the table.
    #[must_use]
    pub fn contains_player(&self, player: PlayerIndex) -> bool {
        self.entries.iter().any(|entry| entry.player == player)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.entries.len() == NUM_PLAYERS
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
