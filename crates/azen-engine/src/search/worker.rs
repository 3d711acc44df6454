//! A single search thread: one tree, one RNG, sequential iterations.

use super::determinize::Determinizer;
use super::rollout::RolloutPolicy;
use super::tree::{NodeId, SearchTree};
use crate::config::SearchConfig;
use azen_core::game::moves::{Move, MoveKey};
use azen_core::game::position::Position;
use azen_core::model::player::PlayerId;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::{trace, warn};

/// Root-child statistics from one worker.
#[derive(Debug, Clone, PartialEq)]
pub struct RootStat {
    pub mv: Move,
    pub visits: u32,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkerReport {
    pub stats: Vec<RootStat>,
    pub iterations: usize,
    /// Iterations whose determinization failed.
    pub skipped: usize,
    pub nodes: usize,
}

/// What one worker is asked to do.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPlan {
    pub index: usize,
    pub seed: u64,
    pub iterations: usize,
}

pub struct SearchWorker<'a> {
    pub position: &'a Position,
    pub determinizer: &'a Determinizer,
    pub root_moves: &'a [Move],
    pub config: &'a SearchConfig,
    pub deadline: Option<Instant>,
}

impl SearchWorker<'_> {
    pub fn run(&self, plan: WorkerPlan) -> WorkerReport {
        let mut rng = StdRng::seed_from_u64(plan.seed);
        let mut tree = SearchTree::new();
        let searcher = self.position.turn();
        let rollout = RolloutPolicy::new(
            &self.config.weights,
            self.config.full_information,
            self.config.rollout_move_cap,
        );
        let mut report = WorkerReport::default();

        for _ in 0..plan.iterations {
            if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                break;
            }
            report.iterations += 1;
            let Some(world) = self.determinizer.sample(self.position, &mut rng) else {
                report.skipped += 1;
                continue;
            };
            let (leaf, world) = self.descend(&mut tree, world, searcher, &mut rng);
            let outcome = rollout.playout(world, searcher, &mut rng);
            tree.backpropagate(leaf, outcome);
        }

        report.nodes = tree.len();
        report.stats = tree
            .root_children()
            .filter_map(|node| {
                node.mv.as_ref().map(|mv| RootStat {
                    mv: mv.clone(),
                    visits: node.visits,
                    score: node.score,
                })
            })
            .collect();
        trace!(
            target: "azen_engine::search",
            worker = plan.index,
            iterations = report.iterations,
            skipped = report.skipped,
            nodes = report.nodes,
            "worker finished"
        );
        report
    }

    /// Selection and expansion in one sampled world.
    fn descend(
        &self,
        tree: &mut SearchTree,
        mut world: Position,
        searcher: PlayerId,
        rng: &mut impl Rng,
    ) -> (NodeId, Position) {
        let mut node = NodeId::ROOT;
        loop {
            if world.is_terminal() {
                break;
            }
            let candidates = if node == NodeId::ROOT {
                self.root_moves.to_vec()
            } else {
                world.legal_moves()
            };
            if candidates.is_empty() {
                break;
            }

            let unexplored: Vec<&Move> = candidates
                .iter()
                .filter(|mv| tree.child_with_key(node, mv.key()).is_none())
                .collect();
            if let Some(mv) = unexplored.choose(rng) {
                let mv = (*mv).clone();
                if !self.step(&mut world, &mv) {
                    break;
                }
                node = tree.add_child(node, mv);
                trace!(target: "azen_engine::search", node = ?node, "expanded");
                break;
            }

            let keys: Vec<MoveKey> = candidates.iter().map(Move::key).collect();
            let maximizing = world.turn() == searcher;
            let Some(child) = tree.select_child(node, &keys, maximizing, self.config.exploration)
            else {
                break;
            };
            let Some(chosen) = tree
                .get(child)
                .key()
                .and_then(|key| candidates.iter().find(|mv| mv.key() == key))
            else {
                break;
            };
            if !self.step(&mut world, chosen) {
                break;
            }
            node = child;
        }
        (node, world)
    }

    fn step(&self, world: &mut Position, mv: &Move) -> bool {
        match world.apply_move(mv) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    target: "azen_engine::search",
                    player = %mv.player,
                    error = %err,
                    "tree move rejected"
                );
                false
            }
        }
    }
}
