pub mod dominance;
pub mod movegen;
pub mod moves;
pub mod position;
pub mod round;
pub mod serialization;
