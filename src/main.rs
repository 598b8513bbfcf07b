use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use gridlearn::learning::{EvolutionConfig, QLearningConfig};
use gridlearn::modes::{
    EvaluateConfig, EvaluateMode, PolicyKind, Task, TrainEvoConfig, TrainEvoMode, TrainQConfig,
    TrainQMode,
};

#[derive(Parser)]
#[command(name = "gridlearn")]
#[command(version, about = "Grid-world learning harness: Q-learning vs neuro-evolution")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum TaskArg {
    /// Reach a beacon using only directional sensing
    Beacon,
    /// Navigate a maze using only local wall/goal sensing
    Maze,
}

impl From<TaskArg> for Task {
    fn from(task: TaskArg) -> Self {
        match task {
            TaskArg::Beacon => Task::Beacon,
            TaskArg::Maze => Task::Maze,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// A Q-table saved by train-q
    QTable,
    /// A genome saved by train-evo
    Genome,
}

impl From<PolicyArg> for PolicyKind {
    fn from(kind: PolicyArg) -> Self {
        match kind {
            PolicyArg::QTable => PolicyKind::QTable,
            PolicyArg::Genome => PolicyKind::Genome,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Train a tabular Q-learning policy
    TrainQ {
        /// Task to train on
        #[arg(long, value_enum)]
        task: TaskArg,

        /// Map file (JSON scenario)
        #[arg(long)]
        map: PathBuf,

        /// Number of training episodes
        #[arg(long, default_value = "500")]
        episodes: usize,

        /// Step budget per episode
        #[arg(long, default_value = "300")]
        max_steps: usize,

        /// Learning rate
        #[arg(long, default_value = "0.3")]
        alpha: f64,

        /// Discount factor
        #[arg(long, default_value = "0.95")]
        gamma: f64,

        /// Exploration probability
        #[arg(long, default_value = "0.2")]
        epsilon: f64,

        /// Where to save the learned policy
        #[arg(long, default_value = "policy.json")]
        policy: PathBuf,
    },

    /// Evolve a recurrent genome controller
    TrainEvo {
        /// Task to evolve controllers for
        #[arg(long, value_enum)]
        task: TaskArg,

        /// Map file (JSON scenario)
        #[arg(long)]
        map: PathBuf,

        /// Individuals per generation
        #[arg(long, default_value = "40")]
        population: usize,

        /// Evolutionary generations
        #[arg(long, default_value = "80")]
        generations: usize,

        /// Simulation steps per evaluation episode
        #[arg(long, default_value = "200")]
        steps_per_agent: usize,

        /// Hidden units in the recurrent controller
        #[arg(long, default_value = "6")]
        hidden: usize,

        /// Probability of mutating each gene
        #[arg(long, default_value = "0.15")]
        mutation_rate: f64,

        /// Standard deviation of the mutation noise
        #[arg(long, default_value = "0.5")]
        mutation_std: f64,

        /// Where to save the best genome
        #[arg(long, default_value = "best_genome.txt")]
        genome: PathBuf,
    },

    /// Evaluate a trained policy over a batch of test episodes
    Evaluate {
        /// Task the policy was trained on
        #[arg(long, value_enum)]
        task: TaskArg,

        /// Map file (JSON scenario)
        #[arg(long)]
        map: PathBuf,

        /// Kind of policy artifact to load
        #[arg(long, value_enum)]
        policy_kind: PolicyArg,

        /// Path of the policy artifact
        #[arg(long)]
        policy: PathBuf,

        /// Number of evaluation episodes
        #[arg(long, default_value = "30")]
        runs: usize,

        /// Step budget per episode
        #[arg(long, default_value = "250")]
        max_steps: usize,

        /// Hidden units the genome was evolved with (genome policies only)
        #[arg(long, default_value = "6")]
        hidden: usize,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::TrainQ {
            task,
            map,
            episodes,
            max_steps,
            alpha,
            gamma,
            epsilon,
            policy,
        } => {
            let mut config = TrainQConfig::new(task.into(), map, policy);
            config.episodes = episodes;
            config.max_steps = max_steps;
            config.qlearning = QLearningConfig {
                alpha,
                gamma,
                epsilon,
            };
            TrainQMode::new(config).run()
        }

        Command::TrainEvo {
            task,
            map,
            population,
            generations,
            steps_per_agent,
            hidden,
            mutation_rate,
            mutation_std,
            genome,
        } => {
            let mut config = TrainEvoConfig::new(task.into(), map, genome);
            config.evolution = EvolutionConfig {
                population,
                generations,
                steps_per_agent,
                hidden,
                mutation_rate,
                mutation_std,
                ..EvolutionConfig::default()
            };
            TrainEvoMode::new(config).run()
        }

        Command::Evaluate {
            task,
            map,
            policy_kind,
            policy,
            runs,
            max_steps,
            hidden,
        } => {
            let mut config = EvaluateConfig::new(task.into(), map, policy_kind.into(), policy);
            config.runs = runs;
            config.max_steps = max_steps;
            config.hidden = hidden;
            EvaluateMode::new(config).run().map(|_| ())
        }
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
