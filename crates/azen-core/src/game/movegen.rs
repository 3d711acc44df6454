//! Exhaustive legal move enumeration.
//!
//! Cards of equal rank are interchangeable, so moves are built from rank
//! counts: each distinct multiset is produced once, using the first cards of
//! each rank found in the hand.

use crate::game::moves::Move;
use crate::game::position::Position;
use crate::game::round::RoundDescriptor;
use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use std::collections::HashSet;

/// Largest number of cards a single play may contain.
pub const MAX_COMBO: usize = 6;

/// Every legal move for the player on turn, pass first. Empty once the game is over.
pub fn legal_moves(position: &Position) -> Vec<Move> {
    if position.is_terminal() {
        return Vec::new();
    }
    let player = position.turn();
    let mut moves = vec![Move::pass(player)];
    moves.extend(plays_for(player, position.hand(player), position.round()));
    dedup(moves)
}

/// Every non-pass play `player` could make from `hand` in `round`.
pub fn plays_for(player: PlayerId, hand: &Hand, round: &RoundDescriptor) -> Vec<Move> {
    let builder = ComboBuilder { player, hand };
    if round.open {
        builder.open_plays()
    } else {
        builder.response_plays(round)
    }
}

struct ComboBuilder<'a> {
    player: PlayerId,
    hand: &'a Hand,
}

impl ComboBuilder<'_> {
    fn open_plays(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        let wilds = self.hand.count_of(Rank::Two);
        let resets = self.hand.count_of(Rank::Joker);

        for rank in Rank::NATURAL {
            let naturals = self.hand.count_of(rank);
            if naturals == 0 {
                continue;
            }
            let max_total = (naturals + wilds).min(MAX_COMBO);
            for total in 1..=max_total {
                let low = total.saturating_sub(wilds).max(1);
                for num_natural in low..=naturals.min(total) {
                    moves.push(self.combo(&[(rank, num_natural), (Rank::Two, total - num_natural)]));
                }
            }
        }

        for total in 1..=wilds.min(MAX_COMBO) {
            moves.push(self.combo(&[(Rank::Two, total)]));
        }

        for num_reset in 1..=resets.min(MAX_COMBO) {
            let max_wild = wilds.min(MAX_COMBO - num_reset);
            for num_wild in 0..=max_wild {
                moves.push(self.combo(&[(Rank::Joker, num_reset), (Rank::Two, num_wild)]));
            }
        }
        moves
    }

    fn response_plays(&self, round: &RoundDescriptor) -> Vec<Move> {
        let mut moves = Vec::new();
        let need = round.count;
        if need == 0 {
            return moves;
        }
        let wilds = self.hand.count_of(Rank::Two);
        let resets = self.hand.count_of(Rank::Joker);

        for rank in Rank::NATURAL {
            if !round.is_beaten_by(rank) {
                continue;
            }
            let naturals = self.hand.count_of(rank);
            if naturals == 0 {
                continue;
            }
            let low = need.saturating_sub(wilds).max(1);
            for num_natural in low..=naturals.min(need) {
                moves.push(self.combo(&[(rank, num_natural), (Rank::Two, need - num_natural)]));
            }
        }

        if wilds >= need {
            moves.push(self.combo(&[(Rank::Two, need)]));
        }

        for num_reset in 1..=resets.min(need) {
            let num_wild = need - num_reset;
            if num_wild <= wilds {
                moves.push(self.combo(&[(Rank::Joker, num_reset), (Rank::Two, num_wild)]));
            }
        }
        moves
    }

    fn combo(&self, parts: &[(Rank, usize)]) -> Move {
        let mut cards: Vec<Card> = Vec::new();
        for &(rank, count) in parts {
            cards.extend(self.hand.of_rank(rank).take(count).copied());
        }
        Move::play(self.player, cards)
    }
}

fn dedup(moves: Vec<Move>) -> Vec<Move> {
    let mut seen = HashSet::with_capacity(moves.len());
    moves
        .into_iter()
        .filter(|mv| seen.insert(mv.key()))
        .collect()
}
