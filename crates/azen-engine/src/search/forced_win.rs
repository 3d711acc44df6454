//! Exact search for wins the opponents cannot prevent.

use crate::config::ForcedWinLimits;
use azen_core::game::moves::Move;
use azen_core::game::position::Position;
use azen_core::model::player::PlayerId;

/// A move that wins regardless of replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForcedWin {
    pub mv: Move,
    /// Set when the move empties the hand on the spot.
    pub immediate: bool,
    pub nodes: usize,
}

struct ForcedWinSearch {
    me: PlayerId,
    node_budget: usize,
    nodes: usize,
}

/// Looks for a forced win for the player to move.
///
/// Emptying plays are always checked; the full search runs only when few
/// cards remain and gives up (returns `None`) once the node budget is spent.
pub fn find_forced_win(position: &Position, limits: &ForcedWinLimits) -> Option<ForcedWin> {
    if position.is_terminal() {
        return None;
    }
    let me = position.turn();
    let in_hand = position.hand_len(me);
    let moves = position.legal_moves();

    if let Some(mv) = moves.iter().find(|mv| !mv.is_pass() && mv.len() == in_hand) {
        return Some(ForcedWin {
            mv: mv.clone(),
            immediate: true,
            nodes: 0,
        });
    }

    let remaining = position.cards_in_hands();
    if remaining > limits.card_ceiling {
        return None;
    }

    let depth = remaining * limits.depth_per_card;
    let mut search = ForcedWinSearch {
        me,
        node_budget: limits.node_budget,
        nodes: 0,
    };
    for mv in moves.iter().filter(|mv| !mv.is_pass()) {
        let mut next = position.clone();
        if next.apply_move(mv).is_err() {
            continue;
        }
        let wins = if next.is_terminal() {
            next.winner() == Some(me)
        } else {
            search.wins(&next, depth.saturating_sub(1))
        };
        if wins {
            return Some(ForcedWin {
                mv: mv.clone(),
                immediate: false,
                nodes: search.nodes,
            });
        }
        if search.exhausted() {
            break;
        }
    }
    None
}

impl ForcedWinSearch {
    fn exhausted(&self) -> bool {
        self.nodes > self.node_budget
    }

    fn wins(&mut self, position: &Position, depth: usize) -> bool {
        self.nodes += 1;
        if self.exhausted() {
            return false;
        }
        if position.is_terminal() {
            return position.winner() == Some(self.me);
        }
        if depth == 0 {
            return false;
        }

        let moves = position.legal_moves();
        if position.turn() == self.me {
            // Passing into an open round only hands the lead around.
            let may_pass = !position.round().open;
            moves
                .iter()
                .filter(|mv| may_pass || !mv.is_pass())
                .any(|mv| self.after(position, mv, depth))
        } else {
            moves.iter().all(|mv| self.after(position, mv, depth))
        }
    }

    fn after(&mut self, position: &Position, mv: &Move, depth: usize) -> bool {
        let mut next = position.clone();
        if next.apply_move(mv).is_err() {
            return false;
        }
        self.wins(&next, depth - 1)
    }
}
