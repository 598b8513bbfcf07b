//! Evolution training mode
//!
//! Wraps the evolutionary trainer for either task and persists the best
//! genome as the policy artifact.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

use crate::grid::{MapSpec, SensorMode};
use crate::learning::{
    save_genome, BeaconAdapter, EvolutionConfig, EvolutionTrainer, MazeAdapter,
};

use super::Task;

/// Configuration for evolution training
#[derive(Debug, Clone)]
pub struct TrainEvoConfig {
    /// Which task to evolve controllers for
    pub task: Task,

    /// Map file describing the scenario
    pub map_path: PathBuf,

    /// Evolution hyperparameters
    pub evolution: EvolutionConfig,

    /// Where to save the best genome
    pub genome_path: PathBuf,
}

impl TrainEvoConfig {
    pub fn new(task: Task, map_path: PathBuf, genome_path: PathBuf) -> Self {
        Self {
            task,
            map_path,
            evolution: EvolutionConfig::default(),
            genome_path,
        }
    }
}

/// Evolution training mode
pub struct TrainEvoMode {
    config: TrainEvoConfig,
}

impl TrainEvoMode {
    pub fn new(config: TrainEvoConfig) -> Self {
        Self { config }
    }

    /// Run the evolutionary loop and save the best genome
    pub fn run(&self) -> Result<()> {
        let spec = MapSpec::load(&self.config.map_path)?;
        let start = spec
            .first_start()
            .context("map declares no start positions")?;

        info!(
            task = ?self.config.task,
            map = ?self.config.map_path,
            population = self.config.evolution.population,
            generations = self.config.evolution.generations,
            steps_per_agent = self.config.evolution.steps_per_agent,
            hidden = self.config.evolution.hidden,
            "starting evolution training"
        );

        let outcome = match self.config.task {
            Task::Beacon => {
                let world = spec.build_world(SensorMode::Beacon);
                EvolutionTrainer::new(self.config.evolution, BeaconAdapter::new(), world, start)?
                    .run()?
            }
            // the evolved controller goes without absolute position on
            // purpose: local sensing plus recurrent memory has to carry it
            Task::Maze => {
                let world = spec.build_world(SensorMode::Maze);
                EvolutionTrainer::new(
                    self.config.evolution,
                    MazeAdapter::new(false),
                    world,
                    start,
                )?
                .run()?
            }
        };

        save_genome(&outcome.best_genome, &self.config.genome_path)?;

        let final_gen = outcome.history.last();
        info!(
            genome = ?self.config.genome_path,
            genome_len = outcome.best_genome.len(),
            final_best_fitness = final_gen.map(|g| g.best_fitness),
            final_reached = final_gen.map(|g| g.reached_goal),
            "evolution complete, best genome saved"
        );

        Ok(())
    }
}
