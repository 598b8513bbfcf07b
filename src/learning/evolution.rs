//! Evolutionary trainer for recurrent genome brains
//!
//! Evaluates each genome over one full episode in a cloned world, scores it
//! by fitness (goal-reach bonus decaying with steps) and by novelty (mean
//! distance to the k nearest behaviors in the archive plus the rest of the
//! population), then selects parents on a hybrid of the two and reproduces
//! through per-gene Gaussian mutation.

use anyhow::{Context, Result};
use rand::rngs::ThreadRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::grid::{Position, World};

use super::adapter::{Mode, TaskAdapter};
use super::agent::{run_episode, LearningAgent};
use super::genome::{Genome, RecurrentBrain};

/// Hyperparameters for the evolutionary trainer
///
/// Defaults match the values the training runs were tuned with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Individuals per generation
    ///
    /// Default: 40
    pub population: usize,

    /// Evolutionary generations
    ///
    /// Default: 80
    pub generations: usize,

    /// Simulation steps per evaluation episode
    ///
    /// Default: 200
    pub steps_per_agent: usize,

    /// Hidden units in the recurrent controller
    ///
    /// Default: 6
    pub hidden: usize,

    /// Probability of mutating each gene
    ///
    /// Default: 0.15
    pub mutation_rate: f64,

    /// Standard deviation of the Gaussian mutation noise
    ///
    /// Default: 0.5
    pub mutation_std: f64,

    /// Top genomes copied verbatim into the next generation
    ///
    /// Default: 10
    pub elite: usize,

    /// Size of the parent pool drawn from the hybrid-score ranking
    ///
    /// Default: 10
    pub parents: usize,

    /// k for k-nearest-neighbor novelty
    ///
    /// Default: 10
    pub k_neighbors: usize,

    /// Most-novel behaviors appended to the archive each generation
    ///
    /// Default: 5
    pub archive_add_top: usize,

    /// Hybrid weight: `w * novelty + (1 - w) * fitness`
    ///
    /// Default: 0.05
    pub novelty_weight: f64,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population: 40,
            generations: 80,
            steps_per_agent: 200,
            hidden: 6,
            mutation_rate: 0.15,
            mutation_std: 0.5,
            elite: 10,
            parents: 10,
            k_neighbors: 10,
            archive_add_top: 5,
            novelty_weight: 0.05,
        }
    }
}

impl EvolutionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that all hyperparameters are in valid ranges
    pub fn validate(&self) -> Result<(), String> {
        if self.population == 0 {
            return Err("population must be at least 1".to_string());
        }
        if self.generations == 0 {
            return Err("generations must be at least 1".to_string());
        }
        if self.steps_per_agent == 0 {
            return Err("steps_per_agent must be at least 1".to_string());
        }
        if self.hidden == 0 {
            return Err("hidden must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(format!(
                "mutation_rate must be in [0, 1], got {}",
                self.mutation_rate
            ));
        }
        if self.mutation_std <= 0.0 {
            return Err(format!(
                "mutation_std must be positive, got {}",
                self.mutation_std
            ));
        }
        if self.elite > self.population {
            return Err(format!(
                "elite ({}) cannot exceed population ({})",
                self.elite, self.population
            ));
        }
        if self.parents == 0 || self.parents > self.population {
            return Err(format!(
                "parents must be in [1, population], got {}",
                self.parents
            ));
        }
        if self.k_neighbors == 0 {
            return Err("k_neighbors must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.novelty_weight) {
            return Err(format!(
                "novelty_weight must be in [0, 1], got {}",
                self.novelty_weight
            ));
        }
        Ok(())
    }
}

/// Per-generation progress summary
#[derive(Debug, Clone, Copy)]
pub struct GenerationSummary {
    pub generation: usize,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub best_novelty: f64,
    pub reached_goal: usize,
    pub archive_len: usize,
}

/// Result of a full evolutionary run
#[derive(Debug, Clone)]
pub struct EvolutionOutcome {
    /// Best genome by fitness across all generations, goal-reachers first
    pub best_genome: Genome,
    pub history: Vec<GenerationSummary>,
}

#[derive(Debug, Clone, Copy)]
struct Evaluation {
    fitness: f64,
    behavior: [f64; 2],
    reached_goal: bool,
}

/// Evolutionary trainer driving one adapter/world pair
pub struct EvolutionTrainer<Ad> {
    config: EvolutionConfig,
    adapter: Ad,
    world: World,
    start: Position,
    archive: Vec<[f64; 2]>,
    rng: ThreadRng,
}

impl<Ad> EvolutionTrainer<Ad>
where
    Ad: TaskAdapter + Clone,
{
    pub fn new(
        config: EvolutionConfig,
        adapter: Ad,
        world: World,
        start: Position,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|msg| anyhow::anyhow!("Invalid evolution config: {}", msg))?;
        Ok(Self {
            config,
            adapter,
            world,
            start,
            archive: Vec::new(),
            rng: rand::thread_rng(),
        })
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Expected genome length for this adapter/config pair
    pub fn genome_len(&self) -> usize {
        Genome::expected_len(
            self.adapter.observation_size(),
            self.config.hidden,
            self.adapter.action_size(),
        )
    }

    /// Run the full evolutionary loop and return the best genome
    pub fn run(&mut self) -> Result<EvolutionOutcome> {
        let genome_len = self.genome_len();
        let mut population: Vec<Genome> = (0..self.config.population)
            .map(|_| Genome::random(&mut self.rng, genome_len))
            .collect();

        let mut best_genome: Option<Genome> = None;
        let mut best_fitness = f64::NEG_INFINITY;
        let mut best_reached = false;
        let mut history = Vec::with_capacity(self.config.generations);

        for generation in 0..self.config.generations {
            let evals = population
                .iter()
                .map(|genome| self.evaluate(genome))
                .collect::<Result<Vec<_>>>()?;

            let novelties: Vec<f64> = (0..evals.len())
                .map(|i| {
                    let others: Vec<[f64; 2]> = self
                        .archive
                        .iter()
                        .copied()
                        .chain(
                            evals
                                .iter()
                                .enumerate()
                                .filter(|&(j, _)| j != i)
                                .map(|(_, e)| e.behavior),
                        )
                        .collect();
                    novelty_of(evals[i].behavior, &others, self.config.k_neighbors)
                })
                .collect();

            let scores: Vec<f64> = evals
                .iter()
                .zip(&novelties)
                .map(|(eval, novelty)| {
                    self.config.novelty_weight * novelty
                        + (1.0 - self.config.novelty_weight) * eval.fitness
                })
                .collect();

            // track the best artifact: goal-reachers beat non-reachers,
            // fitness breaks the rest
            for (i, eval) in evals.iter().enumerate() {
                let better = match (eval.reached_goal, best_reached) {
                    (true, false) => true,
                    (false, true) => false,
                    _ => eval.fitness > best_fitness,
                };
                if better {
                    best_fitness = eval.fitness;
                    best_reached = eval.reached_goal;
                    best_genome = Some(population[i].clone());
                }
            }

            // archive update: top-N most novel behaviors this generation
            let mut by_novelty: Vec<usize> = (0..population.len()).collect();
            by_novelty.sort_by(|&a, &b| novelties[b].total_cmp(&novelties[a]));
            for &i in by_novelty.iter().take(self.config.archive_add_top) {
                self.archive.push(evals[i].behavior);
            }

            let gen_best = evals
                .iter()
                .map(|e| e.fitness)
                .fold(f64::NEG_INFINITY, f64::max);
            let gen_mean = evals.iter().map(|e| e.fitness).sum::<f64>() / evals.len() as f64;
            let reached = evals.iter().filter(|e| e.reached_goal).count();
            let summary = GenerationSummary {
                generation,
                best_fitness: gen_best,
                mean_fitness: gen_mean,
                best_novelty: novelties.iter().copied().fold(0.0, f64::max),
                reached_goal: reached,
                archive_len: self.archive.len(),
            };
            info!(
                generation = generation + 1,
                total = self.config.generations,
                best_fitness = summary.best_fitness,
                mean_fitness = summary.mean_fitness,
                reached_goal = summary.reached_goal,
                archive = summary.archive_len,
                "generation complete"
            );
            history.push(summary);

            // selection and reproduction by hybrid-score ranking
            let mut order: Vec<usize> = (0..population.len()).collect();
            order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

            let parent_pool: Vec<Genome> = order
                .iter()
                .take(self.config.parents)
                .map(|&i| population[i].clone())
                .collect();

            let mut next: Vec<Genome> = order
                .iter()
                .take(self.config.elite)
                .map(|&i| population[i].clone())
                .collect();
            while next.len() < self.config.population {
                let parent = &parent_pool[self.rng.gen_range(0..parent_pool.len())];
                next.push(self.mutate(parent));
            }
            population = next;
        }

        let best_genome = best_genome.context("evolution produced no candidates")?;
        Ok(EvolutionOutcome {
            best_genome,
            history,
        })
    }

    /// Evaluate one genome over a single episode in a cloned world
    fn evaluate(&mut self, genome: &Genome) -> Result<Evaluation> {
        let brain = RecurrentBrain::new(
            genome.clone(),
            self.adapter.observation_size(),
            self.config.hidden,
            self.adapter.action_size(),
        )?;

        let world = self.world.clone();
        let mut agent = LearningAgent::new("evo", self.start, self.adapter.clone(), brain);
        agent.set_mode(Mode::Test);

        let outcome = run_episode(&mut agent, &world, self.config.steps_per_agent);

        let fitness = if outcome.reached_goal {
            50.0 + (self.config.steps_per_agent - outcome.steps) as f64
        } else {
            -0.1 * outcome.steps as f64
        };

        let final_pos = agent.body().position;
        Ok(Evaluation {
            fitness,
            behavior: [final_pos.row as f64, final_pos.col as f64],
            reached_goal: outcome.reached_goal,
        })
    }

    /// Per-gene Gaussian mutation; produces a new genome, never edits in place
    fn mutate(&mut self, parent: &Genome) -> Genome {
        let rate = self.config.mutation_rate;
        let std = self.config.mutation_std;
        let weights = parent
            .weights()
            .iter()
            .map(|&w| {
                if self.rng.gen::<f64>() < rate {
                    w + gaussian(&mut self.rng) * std
                } else {
                    w
                }
            })
            .collect();
        Genome::new(weights)
    }
}

/// Mean Euclidean distance to the k nearest behaviors
fn novelty_of(behavior: [f64; 2], others: &[[f64; 2]], k: usize) -> f64 {
    if others.is_empty() {
        return 0.0;
    }

    let mut distances: Vec<f64> = others
        .iter()
        .map(|other| {
            let d_row = behavior[0] - other[0];
            let d_col = behavior[1] - other[1];
            (d_row * d_row + d_col * d_col).sqrt()
        })
        .collect();
    distances.sort_by(f64::total_cmp);

    let k_eff = k.min(distances.len());
    distances[..k_eff].iter().sum::<f64>() / k_eff as f64
}

/// Standard normal sample via Box-Muller
fn gaussian(rng: &mut ThreadRng) -> f64 {
    let u1 = rng.gen::<f64>().clamp(f64::MIN_POSITIVE, 1.0);
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}
