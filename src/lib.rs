/// Implemented solvers and learners
pub mod algo;

/// Environment trait and the stateful grid-world wrapper
pub mod env;

/// Exploration policies
pub mod exploration;

/// Grid map and deterministic transition model
pub mod grid;

/// Dense value, action-value, and policy tables
pub mod table;

mod util;
