//! Decision entry points: root filtering, forced wins, parallel search and merging.

use crate::config::SearchConfig;
use crate::search::{
    Determinizer, RolloutPolicy, SearchWorker, WorkerPlan, WorkerReport, find_forced_win,
};
use azen_core::game::moves::{Move, MoveKey};
use azen_core::game::position::{MoveError, Position};
use azen_core::knowledge::KnowledgeModel;
use azen_core::model::player::PlayerId;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;
use tracing::{Level, debug, event};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("the game is already over")]
    GameOver,
    #[error("knowledge belongs to {observer} but {turn} is to move")]
    ObserverMismatch { observer: PlayerId, turn: PlayerId },
    #[error("move cannot be analysed")]
    IllegalMove(#[source] MoveError),
}

/// Aggregated statistics for one root move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveDetail {
    pub mv: Move,
    pub win_rate: f64,
    pub visits: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Evaluation {
    /// Estimated win rate of the chosen move.
    pub score: f64,
    /// Visits of the chosen move.
    pub visits: u32,
    /// Considered moves, most visited first.
    pub details: Vec<MoveDetail>,
    /// Set when the move came from the exact endgame search.
    pub forced: bool,
    pub iterations: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub mv: Move,
    pub evaluation: Evaluation,
}

/// Looks `mv` up among the visited moves of an evaluation.
pub fn find_move<'a>(evaluation: &'a Evaluation, mv: &Move) -> Option<&'a MoveDetail> {
    let key = mv.key();
    evaluation
        .details
        .iter()
        .find(|detail| detail.visits > 0 && detail.mv.key() == key)
}

#[derive(Debug, Clone)]
struct Merged {
    mv: Move,
    visits: u32,
    score: f64,
}

impl Merged {
    fn rate(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.score / f64::from(self.visits)
        }
    }
}

/// Search engine for one seat. Owns the master RNG so successive decisions
/// with a fixed seed are reproducible.
#[derive(Debug, Clone)]
pub struct Engine {
    config: SearchConfig,
    rng: StdRng,
}

impl Engine {
    pub fn new(config: SearchConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn check_turn(position: &Position, knowledge: &KnowledgeModel) -> Result<(), EngineError> {
        if position.is_terminal() {
            return Err(EngineError::GameOver);
        }
        if knowledge.observer() != position.turn() {
            return Err(EngineError::ObserverMismatch {
                observer: knowledge.observer(),
                turn: position.turn(),
            });
        }
        Ok(())
    }

    /// Chooses a move for the player on turn.
    pub fn best_move(
        &mut self,
        position: &Position,
        knowledge: &KnowledgeModel,
    ) -> Result<Decision, EngineError> {
        Self::check_turn(position, knowledge)?;
        let started = Instant::now();
        let me = position.turn();

        if let Some(win) = find_forced_win(position, &self.config.forced_win) {
            debug!(
                target: "azen_engine::forced_win",
                seat = %me,
                chosen = %win.mv.key(),
                immediate = win.immediate,
                nodes = win.nodes,
                "forced win"
            );
            let detail = MoveDetail {
                mv: win.mv.clone(),
                win_rate: 1.0,
                visits: 1,
            };
            return Ok(Decision {
                mv: win.mv,
                evaluation: Evaluation {
                    score: 1.0,
                    visits: 1,
                    details: vec![detail],
                    forced: true,
                    iterations: 0,
                    skipped: 0,
                },
            });
        }

        let root_moves = self
            .config
            .dominance
            .filter(position.legal_moves(), position.round());
        let determinizer = Determinizer::new(knowledge, self.config.full_information);
        let deadline = self.config.max_time().map(|limit| started + limit);
        let plans: Vec<WorkerPlan> = self
            .config
            .iteration_shares()
            .into_iter()
            .enumerate()
            .map(|(index, iterations)| WorkerPlan {
                index,
                seed: self.rng.next_u64(),
                iterations,
            })
            .collect();

        let worker = SearchWorker {
            position,
            determinizer: &determinizer,
            root_moves: &root_moves,
            config: &self.config,
            deadline,
        };
        let reports: Vec<WorkerReport> = if plans.len() > 1 {
            plans.into_par_iter().map(|plan| worker.run(plan)).collect()
        } else {
            plans.into_iter().map(|plan| worker.run(plan)).collect()
        };

        let decision = self.merge(position, &reports);
        if tracing::enabled!(Level::DEBUG) {
            event!(
                target: "azen_engine::search",
                Level::DEBUG,
                seat = %me,
                root_moves = root_moves.len(),
                iterations = decision.evaluation.iterations,
                skipped = decision.evaluation.skipped,
                chosen = %decision.mv.key(),
                score = decision.evaluation.score,
                visits = decision.evaluation.visits,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "search decision"
            );
        }
        Ok(decision)
    }

    fn merge(&self, position: &Position, reports: &[WorkerReport]) -> Decision {
        let me = position.turn();
        let mut order: Vec<Merged> = Vec::new();
        let mut index: HashMap<MoveKey, usize> = HashMap::new();
        for stat in reports.iter().flat_map(|report| &report.stats) {
            let key = stat.mv.key();
            match index.get(&key) {
                Some(&slot) => {
                    order[slot].visits += stat.visits;
                    order[slot].score += stat.score;
                }
                None => {
                    index.insert(key, order.len());
                    order.push(Merged {
                        mv: stat.mv.clone(),
                        visits: stat.visits,
                        score: stat.score,
                    });
                }
            }
        }
        let iterations = reports.iter().map(|report| report.iterations).sum();
        let skipped = reports.iter().map(|report| report.skipped).sum();

        let Some(mut chosen) = most_visited(&order) else {
            return Decision {
                mv: Move::pass(me),
                evaluation: Evaluation {
                    iterations,
                    skipped,
                    ..Evaluation::default()
                },
            };
        };

        if self.config.full_information {
            let total: u32 = order.iter().map(|entry| entry.visits).sum();
            let floor = f64::from(total) / 20.0;
            if let Some(best) = best_rate(order.iter().filter(|entry| f64::from(entry.visits) >= floor)) {
                chosen = best;
            }
        }

        if chosen.mv.is_pass() && pass_is_unsafe(position) {
            if let Some(play) = best_rate(
                order
                    .iter()
                    .filter(|entry| !entry.mv.is_pass() && entry.visits > 0),
            ) {
                chosen = play;
            }
        }

        let mut details: Vec<MoveDetail> = order
            .iter()
            .map(|entry| MoveDetail {
                mv: entry.mv.clone(),
                win_rate: entry.rate(),
                visits: entry.visits,
            })
            .collect();
        details.sort_by(|a, b| b.visits.cmp(&a.visits));

        Decision {
            mv: chosen.mv.clone(),
            evaluation: Evaluation {
                score: chosen.rate(),
                visits: chosen.visits,
                details,
                forced: false,
                iterations,
                skipped,
            },
        }
    }

    /// Win rate of `mv` over fresh sampled worlds, each played out once.
    pub fn analyze_move(
        &mut self,
        position: &Position,
        knowledge: &KnowledgeModel,
        mv: &Move,
    ) -> Result<MoveDetail, EngineError> {
        Self::check_turn(position, knowledge)?;
        position.validate_move(mv).map_err(EngineError::IllegalMove)?;

        let me = position.turn();
        let determinizer = Determinizer::new(knowledge, self.config.full_information);
        let rollout = RolloutPolicy::new(
            &self.config.weights,
            self.config.full_information,
            self.config.rollout_move_cap,
        );
        let mut total = 0.0;
        let mut samples = 0u32;
        for _ in 0..self.config.analysis_samples {
            let Some(mut world) = determinizer.sample(position, &mut self.rng) else {
                continue;
            };
            if world.apply_move(mv).is_err() {
                continue;
            }
            total += rollout.playout(world, me, &mut self.rng);
            samples += 1;
        }

        Ok(MoveDetail {
            mv: mv.clone(),
            win_rate: if samples == 0 { 0.0 } else { total / f64::from(samples) },
            visits: samples,
        })
    }
}

fn most_visited(entries: &[Merged]) -> Option<&Merged> {
    let mut best: Option<&Merged> = None;
    for entry in entries {
        if best.is_none_or(|top| entry.visits > top.visits) {
            best = Some(entry);
        }
    }
    best
}

fn best_rate<'a>(entries: impl Iterator<Item = &'a Merged>) -> Option<&'a Merged> {
    let mut best: Option<&Merged> = None;
    for entry in entries {
        if best.is_none_or(|top| entry.rate() > top.rate()) {
            best = Some(entry);
        }
    }
    best
}

/// Passing is overruled when the searcher trails badly or the game is heads-up.
fn pass_is_unsafe(position: &Position) -> bool {
    let me = position.turn();
    let mine = position.hand_len(me);
    let closest = position.min_opponent_hand(me).unwrap_or(0);
    mine >= closest + 4 || (position.active_count() <= 2 && (closest < 9 || mine >= closest))
}

#[cfg(test)]
mod tests {
    use super::{Engine, EngineError, Evaluation, MoveDetail, find_move, pass_is_unsafe};
    use crate::config::SearchConfig;
    use azen_core::game::moves::Move;
    use azen_core::game::position::Position;
    use azen_core::knowledge::KnowledgeModel;
    use azen_core::model::card::parse_cards;
    use azen_core::model::hand::Hand;
    use azen_core::model::player::PlayerId;
    use azen_core::model::table::TableConfig;

    fn position(hands: &[&str]) -> Position {
        let table = TableConfig::new(hands.len(), 1, 18).unwrap();
        let hands = hands
            .iter()
            .map(|text| Hand::with_cards(parse_cards(text).unwrap()))
            .collect();
        Position::with_hands(table, hands, Vec::new(), PlayerId(0)).unwrap()
    }

    #[test]
    fn rejects_knowledge_for_another_seat() {
        let position = position(&["3 4", "5 6", "7 8"]);
        let knowledge = KnowledgeModel::from_position(&position, PlayerId(1));
        let mut engine = Engine::new(SearchConfig::for_testing(1));
        assert!(matches!(
            engine.best_move(&position, &knowledge),
            Err(EngineError::ObserverMismatch { .. })
        ));
    }

    #[test]
    fn analysing_an_illegal_move_fails() {
        let position = position(&["3 4", "5 6", "7 8"]);
        let knowledge = KnowledgeModel::from_position(&position, PlayerId(0));
        let mut engine = Engine::new(SearchConfig::for_testing(1));
        let foreign = Move::play(PlayerId(0), parse_cards("9").unwrap());
        assert!(matches!(
            engine.analyze_move(&position, &knowledge, &foreign),
            Err(EngineError::IllegalMove(_))
        ));
    }

    #[test]
    fn find_move_ignores_unvisited_entries() {
        let play = Move::play(PlayerId(0), parse_cards("3").unwrap());
        let pass = Move::pass(PlayerId(0));
        let evaluation = Evaluation {
            details: vec![
                MoveDetail {
                    mv: play.clone(),
                    win_rate: 0.4,
                    visits: 0,
                },
                MoveDetail {
                    mv: pass.clone(),
                    win_rate: 0.6,
                    visits: 12,
                },
            ],
            ..Evaluation::default()
        };
        assert!(find_move(&evaluation, &play).is_none());
        assert_eq!(find_move(&evaluation, &pass).map(|detail| detail.visits), Some(12));
    }

    #[test]
    fn pass_safety_depends_on_hand_gap() {
        let trailing = position(&["3 4 5 6 7 8", "9 X", "J Q K"]);
        assert!(pass_is_unsafe(&trailing));
        let level = position(&["3 4 5", "9 X J", "Q K A"]);
        assert!(!pass_is_unsafe(&level));
        let heads_up = position(&["3 4 5", "9 X J"]);
        assert!(pass_is_unsafe(&heads_up));
    }
}
