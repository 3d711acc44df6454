use super::position::Position;
use super::round::RoundDescriptor;
use crate::model::card::{Card, CardParseError, format_cards, parse_cards};
use crate::model::hand::Hand;
use crate::model::player::PlayerId;
use crate::model::table::TableConfig;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Human-readable record of a position. Card piles are stored as rank symbols.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionSnapshot {
    pub table: TableConfig,
    pub hands: Vec<String>,
    pub turn: PlayerId,
    pub round: RoundDescriptor,
    #[serde(default)]
    pub played: String,
    #[serde(default)]
    pub dead: String,
    #[serde(default)]
    pub finish_order: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    Cards(CardParseError),
    SeatMismatch { expected: usize, actual: usize },
    UnknownSeat(PlayerId),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Cards(err) => write!(f, "invalid cards in snapshot: {err}"),
            SnapshotError::SeatMismatch { expected, actual } => {
                write!(f, "snapshot has {actual} hands for a {expected}-player table")
            }
            SnapshotError::UnknownSeat(player) => write!(f, "snapshot refers to unknown seat {player}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<CardParseError> for SnapshotError {
    fn from(err: CardParseError) -> Self {
        SnapshotError::Cards(err)
    }
}

impl PositionSnapshot {
    pub fn capture(position: &Position) -> Self {
        PositionSnapshot {
            table: *position.table(),
            hands: position
                .hands()
                .iter()
                .map(|hand| format_cards(hand.cards()))
                .collect(),
            turn: position.turn(),
            round: *position.round(),
            played: format_cards(position.played()),
            dead: format_cards(position.dead()),
            finish_order: position.finish_order().to_vec(),
        }
    }

    pub fn restore(self) -> Result<Position, SnapshotError> {
        let players = self.table.players;
        if self.hands.len() != players {
            return Err(SnapshotError::SeatMismatch {
                expected: players,
                actual: self.hands.len(),
            });
        }
        for seat in std::iter::once(self.turn)
            .chain(std::iter::once(self.round.last_player))
            .chain(self.finish_order.iter().copied())
        {
            if seat.index() >= players {
                return Err(SnapshotError::UnknownSeat(seat));
            }
        }
        let hands = self
            .hands
            .iter()
            .map(|text| parse_pile(text).map(Hand::with_cards))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Position::restore_parts(
            self.table,
            hands,
            self.turn,
            self.round,
            parse_pile(&self.played)?,
            parse_pile(&self.dead)?,
            self.finish_order,
        ))
    }

    pub fn to_json(position: &Position) -> serde_json::Result<String> {
        let snapshot = Self::capture(position);
        serde_json::to_string_pretty(&snapshot)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

fn parse_pile(text: &str) -> Result<Vec<Card>, CardParseError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    parse_cards(text)
}
