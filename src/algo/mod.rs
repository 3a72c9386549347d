pub mod dp;
pub mod td;

pub use dp::DpSolver;
pub use td::{QLearningAgent, SarsaAgent};
