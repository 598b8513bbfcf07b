//! Execution modes: training and evaluation drivers

pub mod evaluate;
pub mod train_evo;
pub mod train_q;

pub use evaluate::{EvaluateConfig, EvaluateMode, EvaluationReport, PolicyKind};
pub use train_evo::{TrainEvoConfig, TrainEvoMode};
pub use train_q::{TrainQConfig, TrainQMode};

/// Which of the two tasks a mode runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    Beacon,
    Maze,
}
