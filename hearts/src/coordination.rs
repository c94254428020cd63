//! Per-node coordination state machine.
//!
//! This is the only place the replicated [`GameState`] is mutated. Inbound
//! datagrams (decoded to [`Inbound`]) funnel through [`Coordinator::handle`];
//! the node's own play goes through [`Coordinator::play_card`]. Both may emit
//! outbound messages through the [`Outbox`] seam and render through the
//! [`TableView`] seam.
//!
//! Turn exclusivity rests on the circulating token: at most one node has it
//! at any instant. A node only ever gains the token by an explicit grant
//! (datagram) or by self-granting where the protocol says so (holding the
//! two of clubs after a deal, or winning a trick). Duplicate grants are
//! ignored.

use log::{debug, info, warn};

use crate::game::entities::{
    Card, Deck, HOST, Hand, NUM_PLAYERS, PlayerIndex, Points, Trick, TrickEntry,
};
use crate::game::{GameState, HandPhase, PlayError, rules};
use crate::net::messages::{GameAction, Inbound, Message};

/// The messaging boundary consumed by the core. Sends are fire-and-forget:
/// implementations log failures and move on, since the protocol carries no
/// acknowledgment layer.
pub trait Outbox {
    /// Send a record to one peer.
    fn send_to(&mut self, message: &Message, to: PlayerIndex);
    /// Send a record to every peer except this node.
    fn broadcast(&mut self, message: &Message);
    /// Grant the exclusive-turn token to a peer.
    fn send_token(&mut self, to: PlayerIndex);
}

/// Render seam. The core reports what happened; how it is displayed is not
/// its concern. All methods default to no-ops so tests can observe only
/// what they care about.
pub trait TableView {
    fn hand_dealt(&mut self, _hand: &[Card]) {}
    fn turn_started(&mut self, _hand: &[Card], _legal: &[Card], _trick: &Trick) {}
    fn table_updated(
        &mut self,
        _trick_number: usize,
        _trick: &Trick,
        _scores: &[Points; NUM_PLAYERS],
    ) {
    }
    fn trick_resolved(
        &mut self,
        _winner: PlayerIndex,
        _cards: &[Card],
        _points: Points,
        _scores: &[Points; NUM_PLAYERS],
    ) {
    }
    fn game_ended(&mut self, _winner: PlayerIndex, _scores: &[Points; NUM_PLAYERS]) {}
}

/// Coordination phase of one node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodePhase {
    /// Freshly constructed; not yet announced.
    Connecting,
    /// Host only: accumulating CONNECT announcements.
    CollectingConnections,
    /// Announced to the host; waiting for the initial deal.
    WaitingForStart,
    /// In play, token elsewhere.
    WaitingForTurn,
    /// In play, token held; the only node permitted to submit a play.
    MyTurn,
    /// Terminal.
    GameOver,
}

/// Whether a deal opens the game or a subsequent hand.
enum DealKind {
    Start,
    Redeal,
}

/// One node's coordination state machine.
pub struct Coordinator {
    player: PlayerIndex,
    phase: NodePhase,
    state: GameState,
}

impl Coordinator {
    #[must_use]
    pub fn new(player: PlayerIndex) -> Self {
        assert!(player < NUM_PLAYERS, "player index out of range");
        Self {
            player,
            phase: NodePhase::Connecting,
            state: GameState::new(),
        }
    }

    #[must_use]
    pub fn player(&self) -> PlayerIndex {
        self.player
    }

    #[must_use]
    pub fn is_host(&self) -> bool {
        self.player == HOST
    }

    #[must_use]
    pub fn phase(&self) -> NodePhase {
        self.phase
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn my_turn(&self) -> bool {
        self.phase == NodePhase::MyTurn && self.state.token_held()
    }

    #[must_use]
    pub fn game_over(&self) -> bool {
        self.state.game_over()
    }

    /// Cards this node could legally play right now.
    #[must_use]
    pub fn legal_plays(&self) -> Vec<Card> {
        rules::legal_plays(
            self.state.hand(),
            self.state.trick(),
            self.state.hearts_broken(),
            self.state.first_trick(),
        )
    }

    /// Begin participating: the host starts collecting connections, every
    /// other node announces itself to the host.
    pub fn start(&mut self, outbox: &mut dyn Outbox) {
        if self.is_host() {
            self.state.register_connection(HOST);
            self.phase = NodePhase::CollectingConnections;
            info!("host waiting for players to announce");
        } else {
            outbox.send_to(
                &Message::Connect {
                    player: self.player,
                },
                HOST,
            );
            self.phase = NodePhase::WaitingForStart;
            info!("player {} announced to the host", self.player);
        }
    }

    /// Host-only: partition `hands` among the players, keep this node's
    /// block, and broadcast the deal. Invoked automatically once all
    /// players have announced (with a shuffled deck) and at every hand
    /// boundary; public so callers can deal a fixed deck.
    pub fn deal(
        &mut self,
        hands: [Hand; NUM_PLAYERS],
        outbox: &mut dyn Outbox,
        view: &mut dyn TableView,
    ) {
        if !self.is_host() {
            warn!("player {} is not the host and cannot deal", self.player);
            return;
        }
        let kind = if self.phase == NodePhase::CollectingConnections {
            DealKind::Start
        } else {
            DealKind::Redeal
        };
        let own = hands[self.player].clone();
        let message = match kind {
            DealKind::Start => Message::StartGame { hands },
            DealKind::Redeal => Message::NewHand { hands },
        };
        outbox.broadcast(&message);
        self.begin_hand(own, view);
    }

    /// The single entry point for decoded inbound traffic.
    pub fn handle(
        &mut self,
        inbound: Inbound,
        outbox: &mut dyn Outbox,
        view: &mut dyn TableView,
    ) {
        if self.state.game_over() {
            match inbound {
                Inbound::Message(Message::GameEnd { winner, .. }) => {
                    debug!(
                        "player {}: redundant GAME_END (winner {winner}) after game end",
                        self.player
                    );
                }
                _ => debug!("player {}: ignoring traffic after game end", self.player),
            }
            return;
        }

        match inbound {
            Inbound::Token => self.receive_token(view),
            Inbound::Unknown(kind) => {
                warn!("player {}: dropping unknown message kind {kind}", self.player);
            }
            Inbound::Message(message) => match message {
                Message::Connect { player } => self.handle_connect(player, outbox, view),
                Message::StartGame { hands } => self.handle_deal(hands, view),
                Message::Game {
                    action: GameAction::Play,
                    card,
                    player,
                } => self.handle_remote_play(card, player, outbox, view),
                Message::EndTrick {
                    winner,
                    points,
                    scores,
                } => self.handle_end_trick(winner, points, &scores, outbox, view),
                Message::Scores { scores } => {
                    debug!("player {}: adopting out-of-band scores", self.player);
                    self.state.adopt_scores(&scores);
                }
                Message::NewHand { hands } => self.handle_new_hand(hands, view),
                Message::GameEnd {
                    winner,
                    final_scores,
                } => self.handle_game_end(winner, &final_scores, view),
            },
        }
    }

    /// The local play path. Only the token holder may submit; an illegal
    /// attempt is rejected with no network side effect and the token is
    /// retained so the caller can re-prompt.
    pub fn play_card(
        &mut self,
        card: Card,
        outbox: &mut dyn Outbox,
        view: &mut dyn TableView,
    ) -> Result<(), PlayError> {
        if self.state.game_over() {
            return Err(PlayError::GameOver);
        }
        if !self.my_turn() {
            return Err(PlayError::OutOfTurn);
        }
        if !self.state.hand().contains(&card) {
            return Err(PlayError::NotInHand(card));
        }
        if !rules::is_legal_play(
            card,
            self.state.trick(),
            self.state.hand(),
            self.state.hearts_broken(),
            self.state.first_trick(),
        ) {
            return Err(PlayError::IllegalPlay(card));
        }

        self.state.remove_from_hand(card);
        self.state.record_play(TrickEntry {
            card,
            player: self.player,
        });
        outbox.broadcast(&Message::Game {
            action: GameAction::Play,
            card,
            player: self.player,
        });
        self.state.clear_token();
        info!("player {} played {card}", self.player);
        view.table_updated(
            self.state.tricks_played() + 1,
            self.state.trick(),
            self.state.scores(),
        );

        if self.state.trick().is_complete() {
            // Trick resolution governs the next token holder.
            self.resolve_table(outbox, view);
        } else {
            let next = (self.player + 1) % NUM_PLAYERS;
            outbox.send_token(next);
            self.phase = NodePhase::WaitingForTurn;
            debug!("player {} forwarded the token to {next}", self.player);
        }
        Ok(())
    }

    fn receive_token(&mut self, view: &mut dyn TableView) {
        if self.state.token_held() {
            // Duplicate or delayed grant; accepting it twice is harmless
            // but it must never create a second believer.
            warn!("player {}: duplicate token grant ignored", self.player);
            return;
        }
        debug!("player {} received the token", self.player);
        self.grant_self_token(view);
    }

    fn handle_connect(
        &mut self,
        player: PlayerIndex,
        outbox: &mut dyn Outbox,
        view: &mut dyn TableView,
    ) {
        if !self.is_host() {
            warn!(
                "player {}: ignoring CONNECT addressed to the host",
                self.player
            );
            return;
        }
        if player >= NUM_PLAYERS {
            warn!("host: dropping CONNECT with bad player index {player}");
            return;
        }
        let count = self.state.register_connection(player);
        info!("player {player} connected ({count}/{NUM_PLAYERS})");
        if self.phase == NodePhase::CollectingConnections && self.state.all_connected() {
            info!("all players connected; dealing the opening hand");
            self.deal(Deck::shuffled().deal(), outbox, view);
        }
    }

    fn handle_deal(&mut self, hands: [Hand; NUM_PLAYERS], view: &mut dyn TableView) {
        if self.is_host() {
            warn!("host: dropping START_GAME from a peer");
            return;
        }
        if !matches!(
            self.phase,
            NodePhase::Connecting | NodePhase::WaitingForStart
        ) {
            warn!(
                "player {}: dropping START_GAME in phase {:?}",
                self.player, self.phase
            );
            return;
        }
        let own = hands[self.player].clone();
        self.begin_hand(own, view);
    }

    fn handle_new_hand(&mut self, hands: [Hand; NUM_PLAYERS], view: &mut dyn TableView) {
        if self.is_host() {
            warn!("host: dropping NEW_HAND from a peer");
            return;
        }
        // Cross-sender race: the host's NEW_HAND can overtake the trick
        // winner's END_TRICK. The resolution is deterministic, so settle
        // the outstanding trick locally before adopting the deal; the
        // straggling END_TRICK is then dropped by its completed-trick
        // guard.
        if self.state.phase() == HandPhase::InHand && self.state.trick().is_complete() {
            self.settle_trick_locally(view);
        }
        if !matches!(
            self.state.phase(),
            HandPhase::AwaitingDeal | HandPhase::HandComplete
        ) {
            warn!(
                "player {}: dropping NEW_HAND mid-hand ({} tricks played)",
                self.player,
                self.state.tricks_played()
            );
            return;
        }
        let own = hands[self.player].clone();
        self.begin_hand(own, view);
    }

    fn handle_remote_play(
        &mut self,
        card: Card,
        player: PlayerIndex,
        outbox: &mut dyn Outbox,
        view: &mut dyn TableView,
    ) {
        if player >= NUM_PLAYERS || player == self.player {
            warn!(
                "player {}: dropping play with bad player index {player}",
                self.player
            );
            return;
        }
        if self.state.trick().is_complete() {
            warn!(
                "player {}: dropping play by {player} into a full trick",
                self.player
            );
            return;
        }
        if self.state.trick().contains_player(player) {
            warn!(
                "player {}: dropping duplicate play by {player} this trick",
                self.player
            );
            return;
        }
        self.state.record_play(TrickEntry { card, player });
        info!("player {player} played {card}");
        view.table_updated(
            self.state.tricks_played() + 1,
            self.state.trick(),
            self.state.scores(),
        );
        if self.state.trick().is_complete() && self.state.phase() == HandPhase::InHand {
            self.resolve_table(outbox, view);
        }
    }

    fn handle_end_trick(
        &mut self,
        winner: PlayerIndex,
        points: Points,
        scores: &[Points; NUM_PLAYERS],
        outbox: &mut dyn Outbox,
        view: &mut dyn TableView,
    ) {
        if winner >= NUM_PLAYERS {
            warn!("player {}: dropping END_TRICK with bad winner {winner}", self.player);
            return;
        }
        if !self.state.trick().is_complete() {
            warn!(
                "player {}: dropping END_TRICK with no completed trick on the table",
                self.player
            );
            return;
        }
        // The broadcast scores are ground truth, even though this node
        // could compute them itself.
        self.state.adopt_scores(scores);
        let cards = self.state.trick().cards();
        self.state.advance_trick();
        self.state.clear_token();
        self.phase = NodePhase::WaitingForTurn;
        view.trick_resolved(winner, &cards, points, self.state.scores());
        self.after_trick_boundary(false, outbox, view);
    }

    fn handle_game_end(
        &mut self,
        winner: PlayerIndex,
        final_scores: &[Points; NUM_PLAYERS],
        view: &mut dyn TableView,
    ) {
        if winner >= NUM_PLAYERS {
            warn!("player {}: dropping GAME_END with bad winner {winner}", self.player);
            return;
        }
        self.state.adopt_scores(final_scores);
        self.state.complete_game(winner);
        self.phase = NodePhase::GameOver;
        info!(
            "game over: player {winner} wins with {} points",
            final_scores[winner]
        );
        view.game_ended(winner, final_scores);
    }

    /// Four cards are down. Every node computes the same result; only the
    /// winner authors the END_TRICK summary and then leads the next trick.
    fn resolve_table(&mut self, outbox: &mut dyn Outbox, view: &mut dyn TableView) {
        let Some((winner, points)) = rules::resolve_trick(self.state.trick()) else {
            return;
        };
        if winner != self.player {
            // Wait for the winner's authoritative summary; keep the table
            // visible in the meantime.
            self.state.clear_token();
            self.phase = NodePhase::WaitingForTurn;
            return;
        }

        self.state.award(winner, points);
        let cards = self.state.trick().cards();
        self.state.advance_trick();
        view.trick_resolved(winner, &cards, points, self.state.scores());
        outbox.broadcast(&Message::EndTrick {
            winner,
            points,
            scores: *self.state.scores(),
        });
        info!(
            "player {} won the trick for {points} points",
            self.player
        );
        self.after_trick_boundary(true, outbox, view);
    }

    /// Local fallback for the NEW_HAND/END_TRICK delivery race: resolve the
    /// completed trick from this node's own computation.
    fn settle_trick_locally(&mut self, view: &mut dyn TableView) {
        let Some((winner, points)) = rules::resolve_trick(self.state.trick()) else {
            return;
        };
        debug!(
            "player {}: settling trick locally before adopting the new deal",
            self.player
        );
        self.state.award(winner, points);
        let cards = self.state.trick().cards();
        self.state.advance_trick();
        self.state.clear_token();
        view.trick_resolved(winner, &cards, points, self.state.scores());
    }

    /// Runs after every trick advancement. Mid-hand, the authoring winner
    /// self-grants the token for the next lead. At a hand boundary, either
    /// the game ends (the author also broadcasts GAME_END) or the host
    /// deals the next hand.
    fn after_trick_boundary(
        &mut self,
        authored: bool,
        outbox: &mut dyn Outbox,
        view: &mut dyn TableView,
    ) {
        if self.state.phase() != HandPhase::HandComplete {
            if authored {
                self.grant_self_token(view);
            }
            return;
        }

        if let Some(game_winner) = self.state.game_result() {
            let scores = *self.state.scores();
            self.state.complete_game(game_winner);
            self.phase = NodePhase::GameOver;
            if authored {
                outbox.broadcast(&Message::GameEnd {
                    winner: game_winner,
                    final_scores: scores,
                });
            }
            info!(
                "game over: player {game_winner} wins with {} points",
                scores[game_winner]
            );
            view.game_ended(game_winner, &scores);
        } else if self.is_host() {
            info!("hand complete; dealing the next hand");
            self.deal(Deck::shuffled().deal(), outbox, view);
        } else {
            self.state.await_deal();
            self.phase = NodePhase::WaitingForTurn;
        }
    }

    /// Adopt a dealt hand; the two of clubs holder self-grants the token,
    /// everyone else explicitly clears it.
    fn begin_hand(&mut self, hand: Hand, view: &mut dyn TableView) {
        self.state.adopt_deal(hand);
        view.hand_dealt(self.state.hand());
        if self.state.has_two_of_clubs() {
            info!("player {} holds the two of clubs and leads", self.player);
            self.grant_self_token(view);
        } else {
            self.state.clear_token();
            self.phase = NodePhase::WaitingForTurn;
        }
    }

    fn grant_self_token(&mut self, view: &mut dyn TableView) {
        if self.state.token_held() {
            return;
        }
        self.state.grant_token();
        self.phase = NodePhase::MyTurn;
        let legal = self.legal_plays();
        view.turn_started(self.state.hand(), &legal, self.state.trick());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{QUEEN_OF_SPADES, Suit, TWO_OF_CLUBS};

    #[derive(Clone, Debug, PartialEq)]
    enum Sent {
        To(PlayerIndex, Message),
        Broadcast(Message),
        Token(PlayerIndex),
    }

    #[derive(Default)]
    struct Recorder {
        sent: Vec<Sent>,
    }

    impl Outbox for Recorder {
        fn send_to(&mut self, message: &Message, to: PlayerIndex) {
            self.sent.push(Sent::To(to, message.clone()));
        }

        fn broadcast(&mut self, message: &Message) {
            self.sent.push(Sent::Broadcast(message.clone()));
        }

        fn send_token(&mut self, to: PlayerIndex) {
            self.sent.push(Sent::Token(to));
        }
    }

    struct NullView;

    impl TableView for NullView {}

    /// One suit per player, except the king of clubs goes to player 0 in
    /// exchange for the three of spades. Player 1 holds the two of clubs.
    fn fixed_hands() -> [Hand; NUM_PLAYERS] {
        let suit_hand = |suit| (2..=14).map(|value| Card(value, suit)).collect::<Hand>();
        let mut hands = [
            suit_hand(Suit::Spade),
            suit_hand(Suit::Club),
            suit_hand(Suit::Diamond),
            suit_hand(Suit::Heart),
        ];
        let three_of_spades = hands[0].remove(1);
        let king_of_clubs = hands[1].remove(11);
        hands[0].push(king_of_clubs);
        hands[1].push(three_of_spades);
        hands
    }

    fn dealt_coordinator(player: PlayerIndex) -> Coordinator {
        let mut coordinator = Coordinator::new(player);
        if coordinator.is_host() {
            coordinator.deal(fixed_hands(), &mut Recorder::default(), &mut NullView);
        } else {
            coordinator.handle(
                Inbound::Message(Message::StartGame {
                    hands: fixed_hands(),
                }),
                &mut Recorder::default(),
                &mut NullView,
            );
        }
        coordinator
    }

    #[test]
    fn non_host_announces_to_host_on_start() {
        let mut outbox = Recorder::default();
        let mut coordinator = Coordinator::new(2);
        coordinator.start(&mut outbox);
        assert_eq!(coordinator.phase(), NodePhase::WaitingForStart);
        assert_eq!(
            outbox.sent,
            vec![Sent::To(HOST, Message::Connect { player: 2 })]
        );
    }

    #[test]
    fn host_deals_once_all_players_announce() {
        let mut outbox = Recorder::default();
        let mut host = Coordinator::new(HOST);
        host.start(&mut outbox);
        assert_eq!(host.phase(), NodePhase::CollectingConnections);

        for player in [1, 2, 2] {
            host.handle(
                Inbound::Message(Message::Connect { player }),
                &mut outbox,
                &mut NullView,
            );
            // A re-announcing player must not inflate the set.
            assert!(outbox.sent.is_empty());
        }

        host.handle(
            Inbound::Message(Message::Connect { player: 3 }),
            &mut outbox,
            &mut NullView,
        );
        assert_eq!(outbox.sent.len(), 1);
        match &outbox.sent[0] {
            Sent::Broadcast(Message::StartGame { hands }) => {
                for hand in hands {
                    assert_eq!(hand.len(), 13);
                }
            }
            other => panic!("expected a START_GAME broadcast, got {other:?}"),
        }
        assert_eq!(host.state().hand().len(), 13);
        assert_eq!(host.state().token_held(), host.state().has_two_of_clubs());
    }

    #[test]
    fn two_of_clubs_holder_self_grants_the_token() {
        let leader = dealt_coordinator(1);
        assert!(leader.my_turn());

        let other = dealt_coordinator(2);
        assert!(!other.my_turn());
        assert_eq!(other.phase(), NodePhase::WaitingForTurn);
    }

    #[test]
    fn duplicate_token_grant_is_idempotent() {
        let mut coordinator = dealt_coordinator(1);
        assert!(coordinator.my_turn());
        coordinator.handle(Inbound::Token, &mut Recorder::default(), &mut NullView);
        assert!(coordinator.my_turn());
    }

    #[test]
    fn play_broadcasts_then_forwards_the_token() {
        let mut outbox = Recorder::default();
        let mut coordinator = dealt_coordinator(1);
        coordinator
            .play_card(TWO_OF_CLUBS, &mut outbox, &mut NullView)
            .unwrap();
        assert_eq!(
            outbox.sent,
            vec![
                Sent::Broadcast(Message::Game {
                    action: GameAction::Play,
                    card: TWO_OF_CLUBS,
                    player: 1,
                }),
                Sent::Token(2),
            ]
        );
        assert!(!coordinator.state().token_held());
        assert!(!coordinator.state().hand().contains(&TWO_OF_CLUBS));
        assert_eq!(coordinator.phase(), NodePhase::WaitingForTurn);
    }

    #[test]
    fn illegal_play_is_rejected_and_the_token_retained() {
        let mut outbox = Recorder::default();
        let mut coordinator = dealt_coordinator(1);
        let result = coordinator.play_card(Card(14, Suit::Club), &mut outbox, &mut NullView);
        assert_eq!(result, Err(PlayError::IllegalPlay(Card(14, Suit::Club))));
        assert!(coordinator.my_turn());
        assert!(outbox.sent.is_empty());
    }

    #[test]
    fn playing_out_of_turn_is_rejected() {
        let mut coordinator = dealt_coordinator(2);
        let result = coordinator.play_card(
            Card(5, Suit::Diamond),
            &mut Recorder::default(),
            &mut NullView,
        );
        assert_eq!(result, Err(PlayError::OutOfTurn));
    }

    #[test]
    fn playing_a_card_not_held_is_rejected() {
        let mut coordinator = dealt_coordinator(1);
        let result = coordinator.play_card(
            Card(5, Suit::Diamond),
            &mut Recorder::default(),
            &mut NullView,
        );
        assert_eq!(result, Err(PlayError::NotInHand(Card(5, Suit::Diamond))));
    }

    #[test]
    fn winner_authors_end_trick_and_leads_the_next() {
        let mut outbox = Recorder::default();
        // Player 0 holds the king of clubs and will win the opening trick.
        let mut coordinator = dealt_coordinator(0);
        for (card, player) in [
            (TWO_OF_CLUBS, 1),
            (Card(2, Suit::Diamond), 2),
            (Card(2, Suit::Heart), 3),
        ] {
            coordinator.handle(
                Inbound::Message(Message::Game {
                    action: GameAction::Play,
                    card,
                    player,
                }),
                &mut outbox,
                &mut NullView,
            );
        }
        coordinator.handle(Inbound::Token, &mut outbox, &mut NullView);
        assert!(coordinator.my_turn());

        outbox.sent.clear();
        coordinator
            .play_card(Card(13, Suit::Club), &mut outbox, &mut NullView)
            .unwrap();
        assert_eq!(
            outbox.sent,
            vec![
                Sent::Broadcast(Message::Game {
                    action: GameAction::Play,
                    card: Card(13, Suit::Club),
                    player: 0,
                }),
                Sent::Broadcast(Message::EndTrick {
                    winner: 0,
                    points: 1,
                    scores: [1, 0, 0, 0],
                }),
            ]
        );
        // The winner leads the next trick.
        assert!(coordinator.my_turn());
        assert_eq!(coordinator.state().tricks_played(), 1);
        assert!(coordinator.state().trick().is_empty());
        assert!(coordinator.state().hearts_broken());
    }

    #[test]
    fn non_winner_waits_for_the_authoritative_summary() {
        let mut outbox = Recorder::default();
        // Player 2 plays the fourth card but cannot win an off-suit trick.
        let mut coordinator = dealt_coordinator(2);
        for (card, player) in [
            (TWO_OF_CLUBS, 1),
            (Card(13, Suit::Club), 0),
            (Card(2, Suit::Heart), 3),
        ] {
            coordinator.handle(
                Inbound::Message(Message::Game {
                    action: GameAction::Play,
                    card,
                    player,
                }),
                &mut outbox,
                &mut NullView,
            );
        }
        coordinator.handle(Inbound::Token, &mut outbox, &mut NullView);
        outbox.sent.clear();
        coordinator
            .play_card(Card(2, Suit::Diamond), &mut outbox, &mut NullView)
            .unwrap();

        // Just the play broadcast: no END_TRICK, no token forward.
        assert_eq!(
            outbox.sent,
            vec![Sent::Broadcast(Message::Game {
                action: GameAction::Play,
                card: Card(2, Suit::Diamond),
                player: 2,
            })]
        );
        assert!(coordinator.state().trick().is_complete());
        assert_eq!(coordinator.state().scores(), &[0; NUM_PLAYERS]);

        coordinator.handle(
            Inbound::Message(Message::EndTrick {
                winner: 0,
                points: 1,
                scores: [1, 0, 0, 0],
            }),
            &mut outbox,
            &mut NullView,
        );
        assert_eq!(coordinator.state().scores(), &[1, 0, 0, 0]);
        assert_eq!(coordinator.state().tricks_played(), 1);
        assert!(coordinator.state().trick().is_empty());
        assert!(!coordinator.my_turn());
    }

    #[test]
    fn end_trick_without_a_full_table_is_dropped() {
        let mut coordinator = dealt_coordinator(2);
        coordinator.handle(
            Inbound::Message(Message::EndTrick {
                winner: 0,
                points: 5,
                scores: [5, 0, 0, 0],
            }),
            &mut Recorder::default(),
            &mut NullView,
        );
        assert_eq!(coordinator.state().scores(), &[0; NUM_PLAYERS]);
        assert_eq!(coordinator.state().tricks_played(), 0);
    }

    #[test]
    fn game_end_is_terminal() {
        let mut coordinator = dealt_coordinator(3);
        coordinator.handle(
            Inbound::Message(Message::GameEnd {
                winner: 2,
                final_scores: [104, 55, 13, 40],
            }),
            &mut Recorder::default(),
            &mut NullView,
        );
        assert!(coordinator.game_over());
        assert_eq!(coordinator.state().winner(), Some(2));
        assert_eq!(coordinator.phase(), NodePhase::GameOver);

        // No state-mutating message is processed afterwards.
        coordinator.handle(
            Inbound::Message(Message::Game {
                action: GameAction::Play,
                card: TWO_OF_CLUBS,
                player: 1,
            }),
            &mut Recorder::default(),
            &mut NullView,
        );
        assert!(coordinator.state().trick().is_empty());
        assert_eq!(
            coordinator.play_card(
                Card(2, Suit::Heart),
                &mut Recorder::default(),
                &mut NullView
            ),
            Err(PlayError::GameOver)
        );
    }

    #[test]
    fn duplicate_and_bad_plays_are_dropped() {
        let mut coordinator = dealt_coordinator(0);
        let play = |card, player| {
            Inbound::Message(Message::Game {
                action: GameAction::Play,
                card,
                player,
            })
        };
        coordinator.handle(
            play(TWO_OF_CLUBS, 1),
            &mut Recorder::default(),
            &mut NullView,
        );
        // Same player twice in one trick.
        coordinator.handle(
            play(Card(3, Suit::Club), 1),
            &mut Recorder::default(),
            &mut NullView,
        );
        // Out-of-range index.
        coordinator.handle(
            play(Card(4, Suit::Club), 7),
            &mut Recorder::default(),
            &mut NullView,
        );
        assert_eq!(coordinator.state().trick().len(), 1);
    }

    #[test]
    fn out_of_band_scores_are_adopted() {
        let mut coordinator = dealt_coordinator(1);
        coordinator.handle(
            Inbound::Message(Message::Scores {
                scores: [3, 1, 4, 1],
            }),
            &mut Recorder::default(),
            &mut NullView,
        );
        assert_eq!(coordinator.state().scores(), &[3, 1, 4, 1]);
    }

    #[test]
    fn unknown_kinds_are_dropped_without_state_change() {
        let mut coordinator = dealt_coordinator(1);
        coordinator.handle(
            Inbound::Unknown("CHAT".to_string()),
            &mut Recorder::default(),
            &mut NullView,
        );
        assert!(coordinator.my_turn());
        assert_eq!(coordinator.state().hand().len(), 13);
    }

    #[test]
    fn queen_of_spades_is_barred_on_the_first_trick_when_avoidable() {
        // Player 0 follows a club lead; the queen stays in hand.
        let mut coordinator = dealt_coordinator(0);
        coordinator.handle(
            Inbound::Message(Message::Game {
                action: GameAction::Play,
                card: TWO_OF_CLUBS,
                player: 1,
            }),
            &mut Recorder::default(),
            &mut NullView,
        );
        let legal = coordinator.legal_plays();
        assert!(legal.contains(&Card(13, Suit::Club)));
        assert!(!legal.contains(&QUEEN_OF_SPADES));
    }
}
