mod heuristic;
mod search;

pub use heuristic::HeuristicAgent;
pub use search::SearchAgent;

use crate::engine::{EngineError, Evaluation};
use azen_core::game::moves::Move;
use azen_core::game::position::Position;
use azen_core::knowledge::KnowledgeModel;

/// What an agent sees when asked to move.
pub struct AgentContext<'a> {
    pub position: &'a Position,
    /// The agent's own view of the hidden hands.
    pub knowledge: &'a KnowledgeModel,
}

/// A chosen move plus whatever statistics produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentMove {
    pub mv: Move,
    pub evaluation: Option<Evaluation>,
}

/// Common interface for everything that can take a seat at the table.
pub trait Agent: Send {
    fn name(&self) -> &str;

    fn choose(&mut self, ctx: &AgentContext) -> Result<AgentMove, EngineError>;
}
