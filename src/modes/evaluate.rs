//! Evaluation mode
//!
//! Loads a trained policy (Q-table or genome), runs a batch of test-mode
//! episodes on a fixed map, and reports success rate, mean steps, and mean
//! reward. No exploration, no learning.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::grid::{MapSpec, Position, SensorMode, World};
use crate::learning::{
    load_genome, load_qtable, run_episode, BeaconAdapter, Brain, Genome, LearningAgent,
    MazeAdapter, Mode, QLearningConfig, RecurrentBrain, TaskAdapter,
};

use super::Task;

/// Which kind of policy artifact to evaluate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// A Q-table saved by `train-q`
    QTable,
    /// A genome saved by `train-evo`
    Genome,
}

/// Configuration for policy evaluation
#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    /// Which task the policy was trained on
    pub task: Task,

    /// Map file describing the scenario
    pub map_path: PathBuf,

    /// Kind of policy artifact to load
    pub policy_kind: PolicyKind,

    /// Path of the policy artifact
    pub policy_path: PathBuf,

    /// Number of evaluation episodes
    pub runs: usize,

    /// Step budget per episode
    pub max_steps: usize,

    /// Hidden units the genome was evolved with (genome policies only)
    pub hidden: usize,
}

impl EvaluateConfig {
    pub fn new(task: Task, map_path: PathBuf, policy_kind: PolicyKind, policy_path: PathBuf) -> Self {
        Self {
            task,
            map_path,
            policy_kind,
            policy_path,
            runs: 30,
            max_steps: 250,
            hidden: 6,
        }
    }
}

/// Aggregate results of an evaluation batch
#[derive(Debug, Clone, Copy)]
pub struct EvaluationReport {
    pub runs: usize,
    pub reached_goal: usize,
    pub mean_steps: f64,
    pub mean_reward: f64,
}

impl EvaluationReport {
    pub fn success_rate(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.reached_goal as f64 / self.runs as f64
        }
    }
}

/// Evaluation mode
pub struct EvaluateMode {
    config: EvaluateConfig,
}

impl EvaluateMode {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    /// Load the policy, run the batch, and return the report
    pub fn run(&self) -> Result<EvaluationReport> {
        let spec = MapSpec::load(&self.config.map_path)?;
        let start = spec
            .first_start()
            .context("map declares no start positions")?;

        let report = match (self.config.task, self.config.policy_kind) {
            (Task::Beacon, PolicyKind::QTable) => {
                let adapter = BeaconAdapter::new();
                let brain = load_qtable(QLearningConfig::default(), &self.config.policy_path)?;
                self.evaluate(spec.build_world(SensorMode::Beacon), adapter, brain, start)
            }
            (Task::Beacon, PolicyKind::Genome) => {
                let adapter = BeaconAdapter::new();
                let brain = self.load_recurrent(&adapter)?;
                self.evaluate(spec.build_world(SensorMode::Beacon), adapter, brain, start)
            }
            (Task::Maze, PolicyKind::QTable) => {
                let adapter = MazeAdapter::new(true);
                let brain = load_qtable(QLearningConfig::default(), &self.config.policy_path)?;
                self.evaluate(spec.build_world(SensorMode::Maze), adapter, brain, start)
            }
            (Task::Maze, PolicyKind::Genome) => {
                let adapter = MazeAdapter::new(false);
                let brain = self.load_recurrent(&adapter)?;
                self.evaluate(spec.build_world(SensorMode::Maze), adapter, brain, start)
            }
        };

        info!(
            policy = ?self.config.policy_path,
            runs = report.runs,
            reached_goal = report.reached_goal,
            success_rate = report.success_rate(),
            mean_steps = report.mean_steps,
            mean_reward = report.mean_reward,
            "evaluation complete"
        );

        Ok(report)
    }

    fn load_recurrent<Ad: TaskAdapter>(&self, adapter: &Ad) -> Result<RecurrentBrain> {
        let expected = Genome::expected_len(
            adapter.observation_size(),
            self.config.hidden,
            adapter.action_size(),
        );
        let genome = load_genome(&self.config.policy_path, expected)?;
        Ok(RecurrentBrain::new(
            genome,
            adapter.observation_size(),
            self.config.hidden,
            adapter.action_size(),
        )?)
    }

    fn evaluate<Ad, B>(
        &self,
        world: World,
        adapter: Ad,
        brain: B,
        start: Position,
    ) -> EvaluationReport
    where
        Ad: TaskAdapter,
        B: Brain<Ad::State, Ad::Action>,
    {
        let mut agent = LearningAgent::new("eval", start, adapter, brain);
        agent.set_mode(Mode::Test);

        let mut reached_goal = 0;
        let mut total_steps = 0;
        let mut total_reward = 0.0;

        for _ in 0..self.config.runs {
            agent.episode_reset(start);
            let outcome = run_episode(&mut agent, &world, self.config.max_steps);
            if outcome.reached_goal {
                reached_goal += 1;
            }
            total_steps += outcome.steps;
            total_reward += outcome.total_reward;
        }

        EvaluationReport {
            runs: self.config.runs,
            reached_goal,
            mean_steps: total_steps as f64 / self.config.runs.max(1) as f64,
            mean_reward: total_reward / self.config.runs.max(1) as f64,
        }
    }
}
