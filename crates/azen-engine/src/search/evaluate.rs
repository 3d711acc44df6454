//! Static scoring of finished and unfinished positions.

use crate::weights::Weights;
use azen_core::game::position::Position;
use azen_core::model::player::PlayerId;
use azen_core::model::rank::Rank;

/// Placement-based score: 1.0 for first place down to 0.0 for last.
pub fn placement_score(position: &Position, player: PlayerId) -> f64 {
    match position.placement(player) {
        Some(place) => score_for_placement(position.players(), place),
        None if position.players() <= 1 => 1.0,
        None => 0.0,
    }
}

/// Score of finishing `place` (0-based) among `players`.
pub fn score_for_placement(players: usize, place: usize) -> f64 {
    if players <= 1 {
        return 1.0;
    }
    (players - 1 - place.min(players - 1)) as f64 / (players - 1) as f64
}

/// Heuristic estimate in `0.0..=1.0` of how well `player` stands.
pub fn evaluate_position(position: &Position, player: PlayerId, weights: &Weights) -> f64 {
    if position.is_finished(player) || position.is_terminal() {
        return placement_score(position, player);
    }
    let hand = position.hand(player);
    let mine = hand.len();
    if mine == 0 {
        return 1.0;
    }
    let closest = position.min_opponent_hand(player).unwrap_or(0);

    let mut score = 0.5 + (closest as f64 - mine as f64) * weights.card_diff_weight;
    let gap = mine.saturating_sub(closest);
    if gap >= 3 {
        score -= (gap as f64).powf(1.2) * weights.urgency_penalty;
    }

    let counts = hand.counts();
    let resets = counts.resets() as f64;
    let wilds = counts.wilds() as f64;
    score += resets * weights.ace_bonus + wilds * weights.wild_bonus;
    if resets > 0.0 && wilds > 0.0 {
        score += resets.min(wilds) * weights.synergy_bonus;
    }

    if wilds == 0.0 && resets == 0.0 {
        score -= counts.get(Rank::King) as f64 * weights.king_penalty;
        score -= counts.get(Rank::Queen) as f64 * weights.queen_penalty;
    }

    if wilds == 0.0 {
        for (rank, count) in counts.iter() {
            if count != 1 {
                continue;
            }
            if (Rank::Three..=Rank::Seven).contains(&rank) {
                score -= weights.isolated_low_penalty;
            } else if (Rank::Eight..=Rank::Ten).contains(&rank) {
                score -= weights.isolated_low_penalty * 0.5;
            }
        }
    }

    for (rank, count) in counts.iter() {
        if rank.is_natural() && count >= 2 {
            score += (count - 1) as f64 * weights.cluster_bonus;
        }
    }

    if position.round().open && position.turn() == player {
        score += weights.tempo_bonus * 1.2;
        if resets > 0.0 {
            score += 0.08;
        }
    }

    score.clamp(0.0, 1.0)
}
