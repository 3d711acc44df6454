//! Information-set Monte Carlo tree search and its building blocks.

pub mod determinize;
pub mod evaluate;
pub mod forced_win;
pub mod rollout;
pub mod tree;
pub mod worker;

pub use determinize::Determinizer;
pub use evaluate::{evaluate_position, placement_score, score_for_placement};
pub use forced_win::{ForcedWin, find_forced_win};
pub use rollout::RolloutPolicy;
pub use tree::{Node, NodeId, SearchTree};
pub use worker::{RootStat, SearchWorker, WorkerPlan, WorkerReport};
