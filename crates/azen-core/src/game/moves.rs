use crate::model::card::{Card, format_cards};
use crate::model::counts::RankCounts;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A single action: playing a set of cards, or passing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub player: PlayerId,
    pub cards: Vec<Card>,
    pub pass: bool,
}

impl Move {
    pub fn pass(player: PlayerId) -> Self {
        Self {
            player,
            cards: Vec::new(),
            pass: true,
        }
    }

    pub fn play(player: PlayerId, cards: Vec<Card>) -> Self {
        Self {
            player,
            cards,
            pass: false,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.pass
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn counts(&self) -> RankCounts {
        RankCounts::from_cards(&self.cards)
    }

    pub fn wild_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_wild()).count()
    }

    pub fn reset_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_reset()).count()
    }

    pub fn natural_count(&self) -> usize {
        self.cards.iter().filter(|c| c.is_natural()).count()
    }

    pub fn contains_reset(&self) -> bool {
        self.cards.iter().any(|c| c.is_reset())
    }

    pub fn contains_wild(&self) -> bool {
        self.cards.iter().any(|c| c.is_wild())
    }

    pub fn contains_special(&self) -> bool {
        self.cards.iter().any(|c| c.is_special())
    }

    /// Highest natural rank in the move, if any.
    pub fn natural_rank(&self) -> Option<Rank> {
        self.cards
            .iter()
            .filter(|c| c.is_natural())
            .map(|c| c.rank)
            .max()
    }

    /// Rank the move counts as on the table. Pure specials inherit `table_rank`.
    pub fn effective_rank(&self, table_rank: Option<Rank>) -> Option<Rank> {
        self.natural_rank().or(table_rank)
    }

    pub fn key(&self) -> MoveKey {
        if self.pass {
            MoveKey::PASS
        } else {
            MoveKey::from_counts(&self.counts())
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pass {
            write!(f, "{}: pass", self.player)
        } else {
            write!(f, "{}: {}", self.player, format_cards(&self.cards))
        }
    }
}

/// Suit-blind identity of a move: the count of each rank packed four bits
/// apiece, with the top bit reserved for passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveKey(u64);

impl MoveKey {
    pub const PASS: MoveKey = MoveKey(1 << 63);

    const BITS: u32 = 4;
    const MASK: u64 = 0xF;

    pub fn from_counts(counts: &RankCounts) -> Self {
        let mut packed = 0u64;
        for (rank, count) in counts.iter() {
            let shift = Self::shift(rank);
            packed |= (count.min(Self::MASK as u8) as u64) << shift;
        }
        MoveKey(packed)
    }

    pub const fn is_pass(self) -> bool {
        self.0 == Self::PASS.0
    }

    pub fn counts(self) -> RankCounts {
        let mut counts = RankCounts::new();
        if self.is_pass() {
            return counts;
        }
        for rank in Rank::ORDERED {
            let count = (self.0 >> Self::shift(rank)) & Self::MASK;
            counts.set(rank, count as u8);
        }
        counts
    }

    fn shift(rank: Rank) -> u32 {
        (rank.value() as u32 - Rank::Three.value() as u32) * Self::BITS
    }
}

impl fmt::Display for MoveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pass() {
            f.write_str("pass")
        } else {
            write!(f, "{}", self.counts())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Move, MoveKey};
    use crate::model::card::{Card, parse_cards};
    use crate::model::player::PlayerId;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    #[test]
    fn effective_rank_prefers_naturals() {
        let mv = Move::play(PlayerId(0), parse_cards("9 2").unwrap());
        assert_eq!(mv.effective_rank(Some(Rank::Five)), Some(Rank::Nine));
    }

    #[test]
    fn pure_specials_inherit_table_rank() {
        let mv = Move::play(PlayerId(0), parse_cards("2 2").unwrap());
        assert_eq!(mv.effective_rank(Some(Rank::Jack)), Some(Rank::Jack));
        assert_eq!(mv.effective_rank(None), None);
    }

    #[test]
    fn key_ignores_suits_and_order() {
        let a = Move::play(
            PlayerId(0),
            vec![Card::new(Rank::Four, Suit::Hearts), Card::new(Rank::Two, Suit::Clubs)],
        );
        let b = Move::play(
            PlayerId(1),
            vec![Card::new(Rank::Two, Suit::Spades), Card::new(Rank::Four, Suit::Diamonds)],
        );
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), Move::play(PlayerId(0), parse_cards("4").unwrap()).key());
    }

    #[test]
    fn key_decodes_back_to_counts() {
        let mv = Move::play(PlayerId(2), parse_cards("0 0 2").unwrap());
        let key = mv.key();
        assert_eq!(key.counts(), mv.counts());
        assert_eq!(key.to_string(), "2 0 0");
        assert!(Move::pass(PlayerId(2)).key().is_pass());
        assert_eq!(MoveKey::PASS.to_string(), "pass");
    }
}
