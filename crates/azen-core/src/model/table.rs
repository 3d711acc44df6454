use crate::model::counts::RankCounts;
use crate::model::rank::Rank;
use core::fmt;
use serde::{Deserialize, Serialize};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;
pub const DEFAULT_HAND_SIZE: usize = 18;
pub const CARDS_PER_DECK: usize = 54;

/// Seating and dealing parameters for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableConfig {
    pub players: usize,
    pub decks: usize,
    pub hand_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    UnsupportedPlayers(usize),
    NoDecks,
    NotEnoughCards { needed: usize, available: usize },
    SeatMismatch { expected: usize, actual: usize },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::UnsupportedPlayers(count) => write!(
                f,
                "{count} players is unsupported (expected {MIN_PLAYERS}..={MAX_PLAYERS})"
            ),
            TableError::NoDecks => write!(f, "at least one deck is required"),
            TableError::NotEnoughCards { needed, available } => {
                write!(f, "dealing needs {needed} cards but only {available} exist")
            }
            TableError::SeatMismatch { expected, actual } => {
                write!(f, "table seats {expected} players but {actual} hands were given")
            }
        }
    }
}

impl std::error::Error for TableError {}

impl TableConfig {
    pub fn new(players: usize, decks: usize, hand_size: usize) -> Result<Self, TableError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players) {
            return Err(TableError::UnsupportedPlayers(players));
        }
        if decks == 0 {
            return Err(TableError::NoDecks);
        }
        let needed = players * hand_size;
        let available = decks * CARDS_PER_DECK;
        if needed > available {
            return Err(TableError::NotEnoughCards { needed, available });
        }
        Ok(Self {
            players,
            decks,
            hand_size,
        })
    }

    /// House setup: a second deck joins only at a four-player table.
    pub fn for_players(players: usize) -> Result<Self, TableError> {
        let decks = if players == 4 { 2 } else { 1 };
        Self::new(players, decks, DEFAULT_HAND_SIZE)
    }

    pub const fn copies_of(&self, rank: Rank) -> u8 {
        let per_deck = if rank.is_reset() { 2 } else { 4 };
        (per_deck * self.decks) as u8
    }

    /// Every card in play at this table, by rank.
    pub fn full_counts(&self) -> RankCounts {
        let mut counts = RankCounts::new();
        for rank in Rank::ORDERED {
            counts.set(rank, self.copies_of(rank));
        }
        counts
    }

    pub const fn total_cards(&self) -> usize {
        self.decks * CARDS_PER_DECK
    }

    /// Hand size below which a pass on a single card is read as "cannot beat".
    pub const fn pass_inference_limit(&self) -> usize {
        self.hand_size / 2
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            players: MAX_PLAYERS,
            decks: 2,
            hand_size: DEFAULT_HAND_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TableConfig, TableError};
    use crate::model::rank::Rank;

    #[test]
    fn four_players_use_two_decks() {
        let table = TableConfig::for_players(4).unwrap();
        assert_eq!(table.decks, 2);
        assert_eq!(table.copies_of(Rank::Two), 8);
        assert_eq!(table.copies_of(Rank::Joker), 4);
        assert_eq!(table.full_counts().total(), 108);
        assert_eq!(table.pass_inference_limit(), 9);
    }

    #[test]
    fn smaller_tables_use_one_deck() {
        let table = TableConfig::for_players(3).unwrap();
        assert_eq!(table.decks, 1);
        assert_eq!(table.full_counts().total(), 54);
    }

    #[test]
    fn rejects_impossible_tables() {
        assert_eq!(
            TableConfig::for_players(5),
            Err(TableError::UnsupportedPlayers(5))
        );
        assert!(matches!(
            TableConfig::new(4, 1, 18),
            Err(TableError::NotEnoughCards { needed: 72, .. })
        ));
    }
}
