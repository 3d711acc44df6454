use super::{Agent, AgentContext, AgentMove};
use crate::config::SearchConfig;
use crate::engine::{Engine, EngineError};

/// Seat driven by the tree search.
pub struct SearchAgent {
    name: String,
    engine: Engine,
}

impl SearchAgent {
    pub fn new(name: impl Into<String>, config: SearchConfig) -> Self {
        Self {
            name: name.into(),
            engine: Engine::new(config),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

impl Agent for SearchAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &AgentContext) -> Result<AgentMove, EngineError> {
        let decision = self.engine.best_move(ctx.position, ctx.knowledge)?;
        Ok(AgentMove {
            mv: decision.mv,
            evaluation: Some(decision.evaluation),
        })
    }
}
