use crate::model::player::PlayerId;
use crate::model::rank::Rank;
use core::fmt;
use serde::{Deserialize, Serialize};

/// The state of the current round: what must be matched and who is leading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDescriptor {
    /// Cards every response must contain. Zero while the round is open.
    pub count: usize,
    /// Rank a response has to beat. `None` when only specials have been played.
    pub table_rank: Option<Rank>,
    pub open: bool,
    /// Last player who played cards rather than passing.
    pub last_player: PlayerId,
    pub consecutive_passes: usize,
}

impl RoundDescriptor {
    pub const fn open(last_player: PlayerId) -> Self {
        Self {
            count: 0,
            table_rank: None,
            open: true,
            last_player,
            consecutive_passes: 0,
        }
    }

    pub const fn response(count: usize, table_rank: Option<Rank>, last_player: PlayerId) -> Self {
        Self {
            count,
            table_rank,
            open: false,
            last_player,
            consecutive_passes: 0,
        }
    }

    /// Whether a natural rank beats the table.
    pub fn is_beaten_by(&self, rank: Rank) -> bool {
        match self.table_rank {
            Some(table) => rank > table,
            None => true,
        }
    }
}

impl fmt::Display for RoundDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.open {
            return write!(f, "open round, led by {}", self.last_player);
        }
        match self.table_rank {
            Some(rank) => write!(f, "{}x{} by {}", self.count, rank, self.last_player),
            None => write!(f, "{}x(any) by {}", self.count, self.last_player),
        }
    }
}
