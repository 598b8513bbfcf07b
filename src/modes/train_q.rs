//! Q-learning training mode
//!
//! Drives repeated training episodes for one agent on a fixed map, then
//! persists the learned Q-table as the policy artifact.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::grid::{MapSpec, Position, SensorMode, World};
use crate::learning::{
    run_episode, save_qtable, BeaconAdapter, LearningAgent, MazeAdapter, Mode, QLearningBrain,
    QLearningConfig, TaskAdapter,
};
use crate::metrics::TrainingStats;

use super::Task;

/// Configuration for Q-learning training
#[derive(Debug, Clone)]
pub struct TrainQConfig {
    /// Which task to train on
    pub task: Task,

    /// Map file describing the scenario
    pub map_path: PathBuf,

    /// Number of training episodes
    pub episodes: usize,

    /// Step budget per episode
    pub max_steps: usize,

    /// Q-learning hyperparameters
    pub qlearning: QLearningConfig,

    /// Where to save the learned policy
    pub policy_path: PathBuf,

    /// Log training progress every N episodes
    pub log_frequency: usize,
}

impl TrainQConfig {
    pub fn new(task: Task, map_path: PathBuf, policy_path: PathBuf) -> Self {
        Self {
            task,
            map_path,
            episodes: 500,
            max_steps: 300,
            qlearning: QLearningConfig::default(),
            policy_path,
            log_frequency: 100,
        }
    }
}

/// Q-learning training mode
pub struct TrainQMode {
    config: TrainQConfig,
}

impl TrainQMode {
    pub fn new(config: TrainQConfig) -> Self {
        Self { config }
    }

    /// Run the training loop and save the policy
    pub fn run(&self) -> Result<()> {
        self.config
            .qlearning
            .validate()
            .map_err(|msg| anyhow::anyhow!("Invalid Q-learning config: {}", msg))?;

        let spec = MapSpec::load(&self.config.map_path)?;
        let start = spec
            .first_start()
            .context("map declares no start positions")?;

        info!(
            task = ?self.config.task,
            map = ?self.config.map_path,
            episodes = self.config.episodes,
            max_steps = self.config.max_steps,
            alpha = self.config.qlearning.alpha,
            gamma = self.config.qlearning.gamma,
            epsilon = self.config.qlearning.epsilon,
            "starting Q-learning training"
        );

        match self.config.task {
            Task::Beacon => self.train(
                spec.build_world(SensorMode::Beacon),
                BeaconAdapter::new(),
                start,
            ),
            // tabular learning gets the absolute position to avoid
            // aliasing distinct cells with identical local sensing
            Task::Maze => self.train(
                spec.build_world(SensorMode::Maze),
                MazeAdapter::new(true),
                start,
            ),
        }
    }

    fn train<Ad>(&self, world: World, adapter: Ad, start: Position) -> Result<()>
    where
        Ad: TaskAdapter,
    {
        let brain = QLearningBrain::new(self.config.qlearning);
        let mut agent = LearningAgent::new("q-agent", start, adapter, brain);
        agent.set_mode(Mode::Train);

        let mut stats = TrainingStats::new(100);

        for episode in 0..self.config.episodes {
            agent.episode_reset(start);
            let outcome = run_episode(&mut agent, &world, self.config.max_steps);
            stats.record_episode(outcome.total_reward, outcome.steps, outcome.reached_goal);

            if (episode + 1) % self.config.log_frequency == 0 {
                info!(
                    episode = episode + 1,
                    total = self.config.episodes,
                    states = agent.brain().states_seen(),
                    "{}",
                    stats.format_summary()
                );
            }
        }

        let brain = agent.into_brain();
        save_qtable(&brain, &self.config.policy_path)?;
        info!(
            policy = ?self.config.policy_path,
            states = brain.states_seen(),
            "training complete, policy saved"
        );

        Ok(())
    }
}
