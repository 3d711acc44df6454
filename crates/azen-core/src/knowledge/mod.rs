//! What one player can infer about cards they cannot see.
//!
//! - `tracker`: the per-observer [`KnowledgeModel`] fed with every move and pass.
//! - `pool`: helpers turning rank counts back into concrete cards.

mod pool;
mod tracker;

pub use pool::cards_from_counts;
pub use tracker::{KnowledgeModel, PassRecord};
