//! Rank multisets. Most rules only care how many cards of each rank are
//! involved, so these compact tables stand in for card lists wherever suits
//! are irrelevant.

use crate::model::card::Card;
use crate::model::rank::Rank;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Number of cards held per rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct RankCounts([u8; Rank::SLOTS]);

impl RankCounts {
    pub const fn new() -> Self {
        Self([0; Rank::SLOTS])
    }

    pub fn from_cards<'a, I>(cards: I) -> Self
    where
        I: IntoIterator<Item = &'a Card>,
    {
        let mut counts = Self::new();
        for card in cards {
            counts.add(card.rank, 1);
        }
        counts
    }

    pub fn get(&self, rank: Rank) -> u8 {
        self.0[rank.value() as usize]
    }

    pub fn set(&mut self, rank: Rank, count: u8) {
        self.0[rank.value() as usize] = count;
    }

    pub fn add(&mut self, rank: Rank, count: u8) {
        let slot = &mut self.0[rank.value() as usize];
        *slot = slot.saturating_add(count);
    }

    /// Removes up to `count` cards of `rank` and returns how many were removed.
    pub fn remove(&mut self, rank: Rank, count: u8) -> u8 {
        let slot = &mut self.0[rank.value() as usize];
        let removed = (*slot).min(count);
        *slot -= removed;
        removed
    }

    pub fn total(&self) -> usize {
        self.0.iter().map(|&count| count as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&count| count == 0)
    }

    /// Ranks with a non-zero count, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Rank, u8)> + '_ {
        Rank::ORDERED
            .iter()
            .copied()
            .map(|rank| (rank, self.get(rank)))
            .filter(|&(_, count)| count > 0)
    }

    pub fn contains(&self, other: &RankCounts) -> bool {
        Rank::ORDERED
            .iter()
            .all(|&rank| self.get(rank) >= other.get(rank))
    }

    /// Saturating per-rank difference.
    pub fn saturating_sub(&self, other: &RankCounts) -> RankCounts {
        let mut result = *self;
        for rank in Rank::ORDERED {
            result.remove(rank, other.get(rank));
        }
        result
    }

    pub fn natural_count(&self) -> usize {
        Rank::NATURAL.iter().map(|&rank| self.get(rank) as usize).sum()
    }

    pub fn wilds(&self) -> u8 {
        self.get(Rank::Two)
    }

    pub fn resets(&self) -> u8 {
        self.get(Rank::Joker)
    }
}

impl fmt::Display for RankCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (rank, count) in self.iter() {
            for _ in 0..count {
                if !first {
                    f.write_str(" ")?;
                }
                write!(f, "{rank}")?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Small set of ranks backed by a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RankSet(u32);

impl RankSet {
    pub const fn new() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, rank: Rank) {
        self.0 |= 1 << rank.value();
    }

    pub const fn contains(&self, rank: Rank) -> bool {
        self.0 & (1 << rank.value()) != 0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = Rank> + '_ {
        Rank::ORDERED
            .iter()
            .copied()
            .filter(move |&rank| self.contains(rank))
    }
}

impl FromIterator<Rank> for RankSet {
    fn from_iter<T: IntoIterator<Item = Rank>>(iter: T) -> Self {
        let mut set = RankSet::new();
        for rank in iter {
            set.insert(rank);
        }
        set
    }
}
