//! Terminal front end for one node.

use std::io::{self, Write};

use hearts::coordination::TableView;
use hearts::game::entities::{
    Card, NUM_PLAYERS, PlayerIndex, Points, Trick, sorted_for_display,
};

pub struct Console {
    player: PlayerIndex,
}

impl Console {
    pub fn new(player: PlayerIndex) -> Self {
        Self { player }
    }

    /// Read a 1-based pick from the numbered legal list. `None` on closed
    /// input.
    pub fn prompt_card(&self, legal: &[Card]) -> Option<Card> {
        let legal = sorted_for_display(legal);
        loop {
            print!("pick a card [1-{}]: ", legal.len());
            let _ = io::stdout().flush();
            let mut line = String::new();
            if io::stdin().read_line(&mut line).ok()? == 0 {
                return None;
            }
            match line.trim().parse::<usize>() {
                Ok(n) if (1..=legal.len()).contains(&n) => return Some(legal[n - 1]),
                _ => println!("enter a number between 1 and {}", legal.len()),
            }
        }
    }
}

impl TableView for Console {
    fn hand_dealt(&mut self, hand: &[Card]) {
        println!("\nyour hand: {}", format_cards(&sorted_for_display(hand)));
    }

    fn turn_started(&mut self, hand: &[Card], legal: &[Card], trick: &Trick) {
        if !trick.is_empty() {
            println!("on the table: {}", format_cards(&trick.cards()));
        }
        println!("your hand: {}", format_cards(&sorted_for_display(hand)));
        let numbered: Vec<String> = sorted_for_display(legal)
            .iter()
            .enumerate()
            .map(|(i, card)| format!("{}:{card}", i + 1))
            .collect();
        println!("your turn. legal plays: {}", numbered.join("  "));
    }

    fn table_updated(
        &mut self,
        trick_number: usize,
        trick: &Trick,
        _scores: &[Points; NUM_PLAYERS],
    ) {
        println!("trick {trick_number}: {}", format_cards(&trick.cards()));
    }

    fn trick_resolved(
        &mut self,
        winner: PlayerIndex,
        cards: &[Card],
        points: Points,
        scores: &[Points; NUM_PLAYERS],
    ) {
        let taker = if winner == self.player {
            "you take".to_string()
        } else {
            format!("player {winner} takes")
        };
        println!(
            "{taker} {} for {points} points; scores {scores:?}",
            format_cards(cards)
        );
    }

    fn game_ended(&mut self, winner: PlayerIndex, scores: &[Points; NUM_PLAYERS]) {
        if winner == self.player {
            println!("game over: you win! final scores {scores:?}");
        } else {
            println!("game over: player {winner} wins. final scores {scores:?}");
        }
    }
}

fn format_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
