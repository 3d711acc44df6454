//! Concrete, fully known game state and the rules that move it forward.

use crate::game::movegen::{self, MAX_COMBO};
use crate::game::moves::Move;
use crate::game::round::RoundDescriptor;
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::hand::Hand;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use crate::model::table::{TableConfig, TableError};
use core::fmt;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    table: TableConfig,
    hands: Vec<Hand>,
    turn: PlayerId,
    round: RoundDescriptor,
    played: Vec<Card>,
    dead: Vec<Card>,
    finished: Vec<bool>,
    finish_order: Vec<PlayerId>,
    terminal: bool,
}

/// Why a move was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    GameOver,
    OutOfTurn { expected: PlayerId, actual: PlayerId },
    EmptyPlay,
    CardsNotInHand,
    TooManyCards { count: usize, max: usize },
    MixedNaturalRanks,
    ResetWithNatural,
    WrongCount { expected: usize, actual: usize },
    DoesNotBeat { rank: Rank, table: Rank },
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::GameOver => write!(f, "the game is over"),
            MoveError::OutOfTurn { expected, actual } => {
                write!(f, "expected {expected} to move but got {actual}")
            }
            MoveError::EmptyPlay => write!(f, "a play needs at least one card (or pass)"),
            MoveError::CardsNotInHand => write!(f, "cards are not in hand"),
            MoveError::TooManyCards { count, max } => {
                write!(f, "{count} cards exceeds the combination limit of {max}")
            }
            MoveError::MixedNaturalRanks => {
                write!(f, "all natural cards in a play must share one rank")
            }
            MoveError::ResetWithNatural => {
                write!(f, "a joker may only be combined with twos or other jokers")
            }
            MoveError::WrongCount { expected, actual } => {
                write!(f, "must play exactly {expected} card(s), got {actual}")
            }
            MoveError::DoesNotBeat { rank, table } => {
                write!(f, "rank {rank} does not beat table rank {table}")
            }
        }
    }
}

impl std::error::Error for MoveError {}

impl Position {
    pub fn deal<R: rand::Rng + ?Sized>(table: TableConfig, starter: PlayerId, rng: &mut R) -> Self {
        let deal = Deck::shuffled(table.decks, rng).deal(table.players, table.hand_size);
        Self::from_parts(table, deal.hands, deal.dead, starter)
    }

    pub fn deal_with_seed(table: TableConfig, starter: PlayerId, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::deal(table, starter, &mut rng)
    }

    /// Builds a position at the start of an open round from explicit hands.
    pub fn with_hands(
        table: TableConfig,
        hands: Vec<Hand>,
        dead: Vec<Card>,
        starter: PlayerId,
    ) -> Result<Self, TableError> {
        if hands.len() != table.players || starter.index() >= table.players {
            return Err(TableError::SeatMismatch {
                expected: table.players,
                actual: hands.len(),
            });
        }
        Ok(Self::from_parts(table, hands, dead, starter))
    }

    fn from_parts(table: TableConfig, hands: Vec<Hand>, dead: Vec<Card>, starter: PlayerId) -> Self {
        let players = hands.len();
        let mut position = Self {
            table,
            hands,
            turn: starter,
            round: RoundDescriptor::open(starter),
            played: Vec::new(),
            dead,
            finished: vec![false; players],
            finish_order: Vec::with_capacity(players),
            terminal: false,
        };
        // Seats dealt no cards are out before the first move.
        for player in PlayerId::all(players) {
            if position.hands[player.index()].is_empty() && !position.terminal {
                position.finish_player(player);
            }
        }
        if position.finished[starter.index()] && !position.terminal {
            position.turn = position.next_active(starter);
        }
        position
    }

    pub fn table(&self) -> &TableConfig {
        &self.table
    }

    pub fn players(&self) -> usize {
        self.hands.len()
    }

    pub fn hand(&self, player: PlayerId) -> &Hand {
        &self.hands[player.index()]
    }

    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    pub fn hand_len(&self, player: PlayerId) -> usize {
        self.hands[player.index()].len()
    }

    /// Replaces a hand wholesale. Used when sampling hidden cards.
    pub fn set_hand(&mut self, player: PlayerId, hand: Hand) {
        self.hands[player.index()] = hand;
    }

    pub fn turn(&self) -> PlayerId {
        self.turn
    }

    pub fn round(&self) -> &RoundDescriptor {
        &self.round
    }

    /// Puts the position mid-round, for setting up scenarios.
    pub fn set_round(&mut self, round: RoundDescriptor, turn: PlayerId) {
        self.round = round;
        self.turn = turn;
    }

    pub fn played(&self) -> &[Card] {
        &self.played
    }

    pub fn dead(&self) -> &[Card] {
        &self.dead
    }

    pub fn is_finished(&self, player: PlayerId) -> bool {
        self.finished[player.index()]
    }

    pub fn finish_order(&self) -> &[PlayerId] {
        &self.finish_order
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.finish_order.first().copied()
    }

    /// Zero-based finishing place, once the player is out.
    pub fn placement(&self, player: PlayerId) -> Option<usize> {
        self.finish_order.iter().position(|&p| p == player)
    }

    pub fn active_count(&self) -> usize {
        self.finished.iter().filter(|&&done| !done).count()
    }

    pub fn active_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        PlayerId::all(self.players()).filter(|&p| !self.is_finished(p))
    }

    /// Smallest hand among active opponents of `player`.
    pub fn min_opponent_hand(&self, player: PlayerId) -> Option<usize> {
        self.active_players()
            .filter(|&p| p != player)
            .map(|p| self.hand_len(p))
            .min()
    }

    /// Cards still held across all hands.
    pub fn cards_in_hands(&self) -> usize {
        self.hands.iter().map(Hand::len).sum()
    }

    /// Cards in hands, played and dead. Constant over a game.
    pub fn total_cards(&self) -> usize {
        self.cards_in_hands() + self.played.len() + self.dead.len()
    }

    /// Next unfinished seat after `from`, or `from` itself if nobody else is left.
    pub fn next_active(&self, from: PlayerId) -> PlayerId {
        let players = self.players();
        let mut seat = from;
        for _ in 0..players {
            seat = seat.next(players);
            if !self.finished[seat.index()] {
                return seat;
            }
        }
        from
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        movegen::legal_moves(self)
    }

    pub fn validate_move(&self, mv: &Move) -> Result<(), MoveError> {
        if self.terminal {
            return Err(MoveError::GameOver);
        }
        if mv.player != self.turn {
            return Err(MoveError::OutOfTurn {
                expected: self.turn,
                actual: mv.player,
            });
        }
        if mv.pass {
            return Ok(());
        }
        if mv.cards.is_empty() {
            return Err(MoveError::EmptyPlay);
        }
        if !self.hands[mv.player.index()].holds(&mv.cards) {
            return Err(MoveError::CardsNotInHand);
        }
        let natural = classify(&mv.cards)?;
        if mv.cards.len() > MAX_COMBO {
            return Err(MoveError::TooManyCards {
                count: mv.cards.len(),
                max: MAX_COMBO,
            });
        }
        if self.round.open {
            return Ok(());
        }
        if mv.cards.len() != self.round.count {
            return Err(MoveError::WrongCount {
                expected: self.round.count,
                actual: mv.cards.len(),
            });
        }
        if let (Some(rank), Some(table)) = (natural, self.round.table_rank) {
            if rank <= table {
                return Err(MoveError::DoesNotBeat { rank, table });
            }
        }
        Ok(())
    }

    /// Validates and applies `mv`. The position is untouched on error.
    pub fn apply_move(&mut self, mv: &Move) -> Result<(), MoveError> {
        self.validate_move(mv)?;
        let player = mv.player;

        if mv.pass {
            self.round.consecutive_passes += 1;
            if self.round.consecutive_passes >= self.pass_threshold() {
                let leader = self.round.last_player;
                self.round = RoundDescriptor::open(leader);
                self.turn = if self.is_finished(leader) {
                    self.next_active(leader)
                } else {
                    leader
                };
            } else {
                self.turn = self.next_active(player);
            }
            return Ok(());
        }

        self.hands[player.index()].remove_all(&mv.cards);
        self.played.extend_from_slice(&mv.cards);

        if self.hands[player.index()].is_empty() {
            if self.finish_player(player) {
                return Ok(());
            }
            self.round = if mv.contains_reset() {
                RoundDescriptor::open(player)
            } else {
                RoundDescriptor::response(
                    mv.cards.len(),
                    mv.effective_rank(self.round.table_rank),
                    player,
                )
            };
            self.turn = self.next_active(player);
            return Ok(());
        }

        if mv.contains_reset() {
            self.round = RoundDescriptor::open(player);
            self.turn = player;
            return Ok(());
        }

        let effective = mv.effective_rank(self.round.table_rank);
        if self.round.open {
            self.round = RoundDescriptor::response(mv.cards.len(), effective, player);
        } else {
            self.round.table_rank = effective;
            self.round.last_player = player;
            self.round.consecutive_passes = 0;
        }
        self.turn = self.next_active(player);
        Ok(())
    }

    fn pass_threshold(&self) -> usize {
        let active = self.active_count();
        if self.is_finished(self.round.last_player) {
            active
        } else {
            active.saturating_sub(1)
        }
    }

    /// Marks `player` as out. Returns `true` when that ends the game.
    fn finish_player(&mut self, player: PlayerId) -> bool {
        self.finished[player.index()] = true;
        self.finish_order.push(player);
        if self.active_count() <= 1 {
            if let Some(last) = PlayerId::all(self.players()).find(|&p| !self.is_finished(p)) {
                self.finished[last.index()] = true;
                self.finish_order.push(last);
            }
            self.terminal = true;
            return true;
        }
        false
    }

    pub(crate) fn restore_parts(
        table: TableConfig,
        hands: Vec<Hand>,
        turn: PlayerId,
        round: RoundDescriptor,
        played: Vec<Card>,
        dead: Vec<Card>,
        finish_order: Vec<PlayerId>,
    ) -> Self {
        let mut finished = vec![false; hands.len()];
        for player in &finish_order {
            if let Some(slot) = finished.get_mut(player.index()) {
                *slot = true;
            }
        }
        let terminal = !finished.is_empty() && finished.iter().all(|&done| done);
        Self {
            table,
            hands,
            turn,
            round,
            played,
            dead,
            finished,
            finish_order,
            terminal,
        }
    }
}

/// Checks natural/special mixing and returns the shared natural rank.
fn classify(cards: &[Card]) -> Result<Option<Rank>, MoveError> {
    let mut natural: Option<Rank> = None;
    let mut has_reset = false;
    for card in cards {
        if card.is_reset() {
            has_reset = true;
        } else if card.is_natural() {
            match natural {
                None => natural = Some(card.rank),
                Some(rank) if rank != card.rank => return Err(MoveError::MixedNaturalRanks),
                Some(_) => {}
            }
        }
    }
    if has_reset && natural.is_some() {
        return Err(MoveError::ResetWithNatural);
    }
    Ok(natural)
}
