//! Cheap rule-of-thumb assessments that need no search.

use azen_core::game::moves::Move;
use azen_core::game::round::RoundDescriptor;
use azen_core::model::hand::Hand;
use azen_core::model::rank::Rank;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandStrength {
    pub card_count: usize,
    pub wild_count: usize,
    /// Jokers held.
    pub ace_count: usize,
    /// Naturals from Jack upward.
    pub high_card_count: usize,
    pub lonely_kings: usize,
    pub pair_count: usize,
    pub triple_count: usize,
    pub tempo_score: i32,
    pub overall: i32,
}

pub fn evaluate_hand(hand: &Hand) -> HandStrength {
    let counts = hand.counts();
    let wild_count = counts.wilds() as usize;
    let ace_count = counts.resets() as usize;
    let mut high_card_count = 0;
    let mut pair_count = 0;
    let mut triple_count = 0;
    let mut low_count = 0;
    for (rank, count) in counts.iter() {
        if !rank.is_natural() {
            continue;
        }
        let count = count as usize;
        if rank >= Rank::Jack {
            high_card_count += count;
        }
        if rank <= Rank::Five {
            low_count += count;
        }
        if count >= 2 {
            pair_count += 1;
        }
        if count >= 3 {
            triple_count += 1;
        }
    }
    let lonely_kings = counts.get(Rank::King) as usize;

    let card_count = hand.len();
    let mut overall = 100 - 5 * card_count as i32 + 8 * wild_count as i32 + 10 * ace_count as i32
        + 3 * pair_count as i32
        + 5 * triple_count as i32
        - 6 * lonely_kings.saturating_sub(wild_count) as i32;
    if ace_count == 0 {
        overall -= 2 * low_count as i32;
    }

    HandStrength {
        card_count,
        wild_count,
        ace_count,
        high_card_count,
        lonely_kings,
        pair_count,
        triple_count,
        tempo_score: 2 * ace_count as i32,
        overall,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveQuality {
    pub score: f64,
    pub reasoning: String,
    pub wastes_wilds: bool,
    pub wastes_resets: bool,
    pub creates_win_threat: bool,
}

/// Grades a move without looking ahead.
pub fn quick_evaluate_move(mv: &Move, hand: &Hand, round: &RoundDescriptor) -> MoveQuality {
    let mut quality = MoveQuality {
        score: 0.0,
        reasoning: String::new(),
        wastes_wilds: false,
        wastes_resets: false,
        creates_win_threat: false,
    };
    if mv.is_pass() {
        quality.reasoning.push_str("pass");
        return quality;
    }
    let cards_after = hand.len().saturating_sub(mv.len());
    if cards_after == 0 {
        quality.score = 100.0;
        quality.creates_win_threat = true;
        quality.reasoning.push_str("empties the hand");
        return quality;
    }

    let mut notes = Vec::new();
    quality.score = 50.0;
    let wilds = mv.wild_count();
    let resets = mv.reset_count();
    let effective = mv.effective_rank(round.table_rank);

    if wilds > 0 && effective.is_none_or(|rank| rank < Rank::Ten) {
        quality.score -= 5.0 * wilds as f64;
        quality.wastes_wilds = true;
        notes.push("spends wildcards low");
    }
    if resets > 0 {
        quality.score += 5.0;
        if resets > 1 {
            quality.wastes_resets = true;
            quality.score -= 8.0 * (resets - 1) as f64;
            notes.push("stacks jokers");
        }
    }
    if let Some(rank) = effective {
        let height = f64::from(rank.value().min(Rank::Ace.value()) - Rank::Three.value());
        let span = f64::from(Rank::Ace.value() - Rank::Three.value());
        quality.score -= 10.0 * height / span;
    }
    quality.score += 2.0 * mv.len() as f64;
    if cards_after <= 3 {
        quality.score += 15.0;
        quality.creates_win_threat = true;
        notes.push("threatens to go out");
    }
    if round.open && resets > 0 {
        quality.score += 10.0;
        notes.push("keeps the lead");
    }
    quality.reasoning = notes.join(", ");
    quality
}

/// Whether holding back is sensible in the current round.
pub fn should_pass(hand: &Hand, round: &RoundDescriptor) -> bool {
    if hand.len() <= 3 || round.open {
        return false;
    }
    let Some(table) = round.table_rank else {
        return false;
    };
    if table <= Rank::Six {
        return false;
    }
    if table >= Rank::King {
        let can_beat = hand
            .iter()
            .any(|card| card.rank.is_natural() && card.rank > table);
        return !can_beat;
    }
    false
}
