//! Weighted random playouts.

use super::evaluate::{evaluate_position, placement_score};
use crate::weights::Weights;
use azen_core::game::moves::Move;
use azen_core::game::position::Position;
use azen_core::model::player::PlayerId;
use azen_core::model::rank::Rank;
use rand::Rng;
use tracing::warn;

/// Pass-chance multipliers by how many cards the mover trails the closest opponent.
const BEHIND_SCHEDULE: [(usize, f64); 6] = [
    (7, 0.03),
    (6, 0.08),
    (5, 0.15),
    (4, 0.25),
    (3, 0.42),
    (2, 0.72),
];

#[derive(Debug, Clone, Copy)]
pub struct RolloutPolicy<'a> {
    weights: &'a Weights,
    full_information: bool,
    move_cap: usize,
}

impl<'a> RolloutPolicy<'a> {
    pub fn new(weights: &'a Weights, full_information: bool, move_cap: usize) -> Self {
        Self {
            weights,
            full_information,
            move_cap,
        }
    }

    /// Plays `position` out and scores it for `searcher`.
    pub fn playout<R: Rng + ?Sized>(&self, mut position: Position, searcher: PlayerId, rng: &mut R) -> f64 {
        for _ in 0..self.move_cap {
            if position.is_terminal() {
                break;
            }
            let moves = position.legal_moves();
            if moves.is_empty() {
                break;
            }
            let mut mv = self.choose(&position, &moves, rng);
            if mv.is_pass() && self.full_information {
                if let Some(play) = cheapest_play(&position, &moves) {
                    mv = play;
                }
            }
            if let Err(err) = position.apply_move(&mv) {
                warn!(
                    target: "azen_engine::search",
                    player = %mv.player,
                    error = %err,
                    "rollout move rejected"
                );
                break;
            }
        }

        if position.is_terminal() {
            placement_score(&position, searcher)
        } else {
            evaluate_position(&position, searcher, self.weights)
        }
    }

    /// Draws one of `moves` for the player to move.
    pub fn choose<R: Rng + ?Sized>(&self, position: &Position, moves: &[Move], rng: &mut R) -> Move {
        let me = position.turn();
        let hand = position.hand(me);
        let in_hand = hand.len();
        let round = position.round();

        let plays: Vec<&Move> = moves.iter().filter(|mv| !mv.is_pass()).collect();
        if let Some(winning) = plays.iter().find(|mv| mv.len() == in_hand) {
            return (*winning).clone();
        }
        if plays.is_empty() {
            return Move::pass(me);
        }

        let counts = hand.counts();
        let w = self.weights;
        let specials = (counts.wilds() + counts.resets()) as f64;
        let special_ratio = specials / in_hand.max(1) as f64;
        let mut pass_chance = w.pass_base + special_ratio * w.pass_special_factor;

        let active = position.active_count();
        if in_hand >= 8 && active > 2 {
            let neighbour = position.active_players().find(|p| *p != me);
            if neighbour.is_some_and(|p| in_hand <= position.hand_len(p)) {
                pass_chance += w.early_game_pass_factor;
            }
        }

        let closest = position.min_opponent_hand(me).unwrap_or(0);
        let behind = in_hand.saturating_sub(closest);
        if let Some((_, factor)) = BEHIND_SCHEDULE.iter().find(|(gap, _)| behind >= *gap) {
            pass_chance *= factor;
        }

        let holds_beater = counts.wilds() > 0
            || counts.resets() > 0
            || counts
                .iter()
                .any(|(rank, _)| rank.is_natural() && round.is_beaten_by(rank));
        if closest <= 5 && !round.open && holds_beater {
            pass_chance = 0.02;
        }
        if active <= 2 {
            pass_chance *= if closest < 9 { 0.10 } else { 0.35 };
        }

        let can_pass = moves.iter().any(Move::is_pass);
        if can_pass && rng.gen_range(0.0..1.0) < pass_chance {
            return Move::pass(me);
        }

        let play_weights: Vec<f64> = plays
            .iter()
            .map(|mv| self.play_weight(position, mv))
            .collect();
        let total: f64 = play_weights.iter().sum();
        let target = rng.gen_range(0.0..1.0) * total;
        let mut cumulative = 0.0;
        for (mv, weight) in plays.iter().zip(&play_weights) {
            cumulative += weight;
            if target <= cumulative {
                return (*mv).clone();
            }
        }
        plays[plays.len() - 1].clone()
    }

    fn play_weight(&self, position: &Position, mv: &Move) -> f64 {
        let w = self.weights;
        let hand = position.hand(mv.player);
        let round = position.round();
        let wilds = mv.wild_count();
        let resets = mv.reset_count();
        let effective = mv
            .effective_rank(round.table_rank)
            .map_or(0, Rank::value);

        let mut weight = w.ace_play_factor.powi(resets as i32) * w.wild_play_factor.powi(wilds as i32);

        if wilds > 0 {
            let waste = if hand.len() >= 12 {
                match effective {
                    0..=5 => 0.09,
                    6..=8 => 0.28,
                    9..=12 => 0.40,
                    _ => 1.0,
                }
            } else {
                match effective {
                    0..=6 => 0.25,
                    7..=9 => 0.45,
                    _ => 1.0,
                }
            };
            weight *= waste;
        }

        if !mv.contains_special() {
            if effective <= 5 {
                weight *= 1.6;
            } else if effective <= 8 {
                weight *= 1.3;
            }
            if !round.open && round.count == 1 && mv.len() == 1 {
                if let Some(rank) = mv.natural_rank() {
                    weight *= if hand.count_of(rank) == 1 { 2.2 } else { 0.55 };
                }
            }
        }

        if resets > 0 {
            weight *= if round.open { 5.5 } else { 2.9 };
            if wilds > 0 {
                if round.open {
                    weight *= 2.1;
                }
                weight *= w.synergy_penalty;
            }
        }

        for card in mv.cards.iter().filter(|card| card.rank.is_natural()) {
            weight *= 1.0 + w.rank_preference * (13.0 - card.rank.value() as f64);
        }
        weight
    }
}

/// Lowest special-free play; in open rounds ties prefer larger sets.
fn cheapest_play(position: &Position, moves: &[Move]) -> Option<Move> {
    let round = position.round();
    let rank_of = |mv: &Move| mv.effective_rank(round.table_rank).map_or(0, Rank::value);
    let candidates = moves
        .iter()
        .filter(|mv| !mv.is_pass() && !mv.contains_special());
    let best = if round.open {
        candidates.min_by(|a, b| rank_of(*a).cmp(&rank_of(*b)).then(b.len().cmp(&a.len())))
    } else {
        candidates.min_by_key(|mv| rank_of(*mv))
    };
    best.cloned()
}

#[cfg(test)]
mod tests {
    use super::{RolloutPolicy, cheapest_play};
    use crate::weights::Weights;
    use azen_core::game::position::Position;
    use azen_core::model::card::{format_cards, parse_cards};
    use azen_core::model::hand::Hand;
    use azen_core::model::player::PlayerId;
    use azen_core::model::table::TableConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn position(hands: &[&str]) -> Position {
        let table = TableConfig::new(hands.len(), 1, 12).unwrap();
        let hands = hands
            .iter()
            .map(|text| Hand::with_cards(parse_cards(text).unwrap()))
            .collect();
        Position::with_hands(table, hands, Vec::new(), PlayerId(0)).unwrap()
    }

    #[test]
    fn emptying_play_is_always_taken() {
        let weights = Weights::default();
        let policy = RolloutPolicy::new(&weights, false, 400);
        let position = position(&["7 7", "3 4 5"]);
        let moves = position.legal_moves();
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let mv = policy.choose(&position, &moves, &mut rng);
            assert_eq!(format_cards(&mv.cards), "7 7");
        }
    }

    #[test]
    fn chosen_moves_are_legal() {
        let weights = Weights::default();
        let policy = RolloutPolicy::new(&weights, false, 400);
        let position = position(&["3 3 5 9 J 2 0", "4 6 8 X Q K", "3 5 7 9 A"]);
        let moves = position.legal_moves();
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..50 {
            let mv = policy.choose(&position, &moves, &mut rng);
            assert!(position.validate_move(&mv).is_ok());
        }
    }

    #[test]
    fn playouts_stay_in_unit_interval() {
        let weights = Weights::default();
        let mut rng = StdRng::seed_from_u64(4);
        for full_information in [false, true] {
            let policy = RolloutPolicy::new(&weights, full_information, 400);
            let start = Position::deal_with_seed(TableConfig::default(), PlayerId(0), 77);
            let score = policy.playout(start, PlayerId(0), &mut rng);
            assert!((0.0..=1.0).contains(&score));
        }
    }

    #[test]
    fn move_cap_falls_back_to_evaluation() {
        let weights = Weights::default();
        let policy = RolloutPolicy::new(&weights, false, 1);
        let start = Position::deal_with_seed(TableConfig::default(), PlayerId(0), 5);
        let mut rng = StdRng::seed_from_u64(4);
        let score = policy.playout(start, PlayerId(0), &mut rng);
        assert!((0.0..=1.0).contains(&score));
    }

    #[test]
    fn cheapest_open_play_prefers_larger_sets() {
        let position = position(&["4 4 9 2", "3 5"]);
        let play = cheapest_play(&position, &position.legal_moves()).unwrap();
        assert_eq!(format_cards(&play.cards), "4 4");
    }
}
