//! Position evaluation

pub mod heuristic;
pub mod weights;

pub use heuristic::{evaluate, sequence_score};
pub use weights::SequenceWeight;
