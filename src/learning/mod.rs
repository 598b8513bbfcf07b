//! Learning core: adapters, brains, and the agent loop
//!
//! Provides:
//! - The task adapter contract separating task semantics from policies
//! - Beacon and maze adapter implementations
//! - A tabular Q-learning brain and a recurrent genome brain
//! - The generic learning agent driving the observe/act/learn cycle
//! - The evolutionary trainer and flat-file policy persistence

pub mod adapter;
pub mod agent;
pub mod beacon;
pub mod error;
pub mod evolution;
pub mod genome;
pub mod maze;
pub mod persistence;
pub mod qlearning;

pub use adapter::{Brain, EpisodeMemory, Mode, TaskAction, TaskAdapter, TaskState};
pub use agent::{run_episode, EpisodeOutcome, LearningAgent};
pub use beacon::{BeaconAction, BeaconAdapter, BeaconState};
pub use error::LearningError;
pub use evolution::{EvolutionConfig, EvolutionOutcome, EvolutionTrainer, GenerationSummary};
pub use genome::{Genome, RecurrentBrain};
pub use maze::{MazeAction, MazeAdapter, MazeState};
pub use persistence::{load_genome, load_qtable, save_genome, save_qtable};
pub use qlearning::{QLearningBrain, QLearningConfig};
