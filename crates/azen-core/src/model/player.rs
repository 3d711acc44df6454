use core::fmt;
use serde::{Deserialize, Serialize};

/// Seat index at the table, starting at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub usize);

impl PlayerId {
    pub const fn index(self) -> usize {
        self.0
    }

    /// The following seat, wrapping around a table of `players` seats.
    pub const fn next(self, players: usize) -> PlayerId {
        PlayerId((self.0 + 1) % players)
    }

    pub fn all(players: usize) -> impl Iterator<Item = PlayerId> {
        (0..players).map(PlayerId)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}
