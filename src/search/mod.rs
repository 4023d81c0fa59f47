//! Game-tree search
//!
//! Contains:
//! - Fail-hard alpha-beta over [`BoardState`](crate::board::BoardState) successors
//! - Exhaustive minimax for cross-checking
//! - Sibling-parallel search on the rayon pool with a shared bound
//! - Iterative deepening under a deadline

pub mod alphabeta;

pub use alphabeta::{minimax, search, Line, Score, SearchResult, Searcher, INF};
