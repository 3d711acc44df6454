use super::{Agent, AgentContext, AgentMove};
use crate::engine::EngineError;
use crate::heuristics::{quick_evaluate_move, should_pass};
use azen_core::game::moves::Move;
use tracing::{Level, event};

/// Seat driven by the one-ply heuristics: holds back against high tables,
/// otherwise plays the best-graded legal play.
pub struct HeuristicAgent {
    name: String,
}

impl HeuristicAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Agent for HeuristicAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &AgentContext) -> Result<AgentMove, EngineError> {
        let position = ctx.position;
        if position.is_terminal() {
            return Err(EngineError::GameOver);
        }
        let me = position.turn();
        let hand = position.hand(me);
        let round = position.round();
        let moves = position.legal_moves();

        let mut best: Option<(&Move, f64)> = None;
        for mv in moves.iter().filter(|mv| !mv.is_pass()) {
            let score = quick_evaluate_move(mv, hand, round).score;
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((mv, score));
            }
        }

        let (mv, reason) = match best {
            Some((mv, _)) if mv.len() == hand.len() => (mv.clone(), "goes_out"),
            _ if should_pass(hand, round) => (Move::pass(me), "holds_back"),
            Some((mv, _)) => (mv.clone(), "best_graded"),
            None => (Move::pass(me), "no_play"),
        };

        if tracing::enabled!(Level::DEBUG) {
            event!(
                target: "azen_engine::agent",
                Level::DEBUG,
                agent = %self.name,
                seat = %me,
                legal_count = moves.len(),
                chosen = %mv.key(),
                reason,
            );
        }
        Ok(AgentMove {
            mv,
            evaluation: None,
        })
    }
}
