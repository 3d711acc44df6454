//! Root-level pruning of plays that waste wildcards.

use crate::game::moves::Move;
use crate::game::round::RoundDescriptor;
use crate::model::rank::Rank;
use serde::{Deserialize, Serialize};

/// How much a wildcard must gain over the best natural play to be worth spending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DominanceRule {
    /// Natural maximum at or above which the extra margin applies.
    pub high_rank: Rank,
    /// Extra ranks a wildcard play must clear once the natural maximum is high.
    pub high_margin: u8,
}

impl Default for DominanceRule {
    fn default() -> Self {
        Self {
            high_rank: Rank::Ten,
            high_margin: 1,
        }
    }
}

impl DominanceRule {
    /// Highest effective rank a wildcard play must exceed.
    fn threshold(&self, max_natural: Rank) -> u8 {
        if max_natural >= self.high_rank {
            max_natural.value() + self.high_margin
        } else {
            max_natural.value()
        }
    }

    /// Drops plays that never beat spending no specials at all.
    ///
    /// Open rounds and hands with no pure-natural answer are returned untouched.
    pub fn filter(&self, moves: Vec<Move>, round: &RoundDescriptor) -> Vec<Move> {
        if round.open {
            return moves;
        }
        let table_rank = round.table_rank;
        let max_natural = moves
            .iter()
            .filter(|mv| !mv.pass && !mv.contains_special() && mv.natural_count() > 0)
            .filter_map(|mv| mv.effective_rank(table_rank))
            .max();
        let Some(max_natural) = max_natural else {
            return moves;
        };
        let natural_beats_table = Some(max_natural) > table_rank;
        let threshold = self.threshold(max_natural);

        moves
            .into_iter()
            .filter(|mv| {
                if mv.pass {
                    return true;
                }
                let has_wild = mv.contains_wild();
                let has_reset = mv.contains_reset();
                if mv.len() > round.count && (has_wild || has_reset) && natural_beats_table {
                    return false;
                }
                if !has_wild {
                    return true;
                }
                if mv.natural_count() == 0 && !has_reset {
                    return false;
                }
                mv.effective_rank(table_rank)
                    .is_some_and(|rank| rank.value() > threshold)
            })
            .collect()
    }
}

/// Applies the default [`DominanceRule`].
pub fn filter_dominated(moves: Vec<Move>, round: &RoundDescriptor) -> Vec<Move> {
    DominanceRule::default().filter(moves, round)
}
