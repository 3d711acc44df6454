//! Decision engine for Azen: information-set tree search over sampled deals,
//! an exact endgame solver and lightweight heuristic play.

pub mod agent;
pub mod config;
pub mod engine;
pub mod heuristics;
pub mod search;
pub mod weights;

pub use agent::{Agent, AgentContext, AgentMove, HeuristicAgent, SearchAgent};
pub use config::{ConfigError, ForcedWinLimits, SearchConfig};
pub use engine::{Decision, Engine, EngineError, Evaluation, MoveDetail, find_move};
pub use weights::{Weights, WeightsError};
