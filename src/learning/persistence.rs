//! Policy persistence
//!
//! Two flat-file formats, one per brain type:
//!
//! - Q-table: a versioned JSON document carrying the action vocabulary and
//!   a list of `{state, values}` entries. State records are serialized
//!   structurally, so the key space reloads exactly as it was saved — no
//!   stringified-key round trip to get subtly wrong.
//! - Genome: a single line of comma-separated floats.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::adapter::{TaskAction, TaskState};
use super::error::LearningError;
use super::genome::Genome;
use super::qlearning::{QLearningBrain, QLearningConfig};

/// Current Q-table file format version
pub const QTABLE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct QTableFile<S> {
    version: u32,
    actions: Vec<String>,
    entries: Vec<QTableEntry<S>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct QTableEntry<S> {
    state: S,
    values: Vec<f64>,
}

fn action_labels<A: TaskAction>() -> Vec<String> {
    A::ALL.iter().map(|a| a.label().to_string()).collect()
}

/// Save a Q-learning brain's table to a JSON policy file
pub fn save_qtable<S, A>(brain: &QLearningBrain<S, A>, path: &Path) -> Result<()>
where
    S: TaskState,
    A: TaskAction,
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let file = QTableFile {
        version: QTABLE_FORMAT_VERSION,
        actions: action_labels::<A>(),
        entries: brain
            .table()
            .iter()
            .map(|(state, values)| QTableEntry {
                state: state.clone(),
                values: values.clone(),
            })
            .collect(),
    };

    let json = serde_json::to_string(&file).context("Failed to serialize Q-table")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write policy to {:?}", path))
}

/// Load a Q-learning brain from a JSON policy file
///
/// Verifies the format version and the action vocabulary so a policy is
/// never silently reinterpreted against the wrong action order.
pub fn load_qtable<S, A>(config: QLearningConfig, path: &Path) -> Result<QLearningBrain<S, A>>
where
    S: TaskState,
    A: TaskAction,
{
    if !path.exists() {
        return Err(LearningError::PolicyNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read policy from {:?}", path))?;
    let file: QTableFile<S> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse policy file {:?}", path))?;

    if file.version != QTABLE_FORMAT_VERSION {
        return Err(LearningError::PolicyVersion {
            path: path.to_path_buf(),
            found: file.version,
            expected: QTABLE_FORMAT_VERSION,
        }
        .into());
    }

    let expected = action_labels::<A>();
    if file.actions != expected {
        return Err(LearningError::ActionSetMismatch {
            path: path.to_path_buf(),
            found: file.actions,
            expected,
        }
        .into());
    }

    let mut table = HashMap::with_capacity(file.entries.len());
    for entry in file.entries {
        anyhow::ensure!(
            entry.values.len() == A::ALL.len(),
            "policy file {:?} has a value row of length {}, expected {}",
            path,
            entry.values.len(),
            A::ALL.len()
        );
        table.insert(entry.state, entry.values);
    }

    Ok(QLearningBrain::with_table(config, table))
}

/// Save a genome as one line of comma-separated floats
pub fn save_genome(genome: &Genome, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let line = genome
        .weights()
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>()
        .join(",");
    std::fs::write(path, line).with_context(|| format!("Failed to write genome to {:?}", path))
}

/// Load a genome, checking it has exactly the expected weight count
pub fn load_genome(path: &Path, expected_len: usize) -> Result<Genome> {
    if !path.exists() {
        return Err(LearningError::GenomeNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read genome from {:?}", path))?;

    let weights = raw
        .trim()
        .split(',')
        .map(|field| {
            field
                .trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid weight '{}' in genome file {:?}", field, path))
        })
        .collect::<Result<Vec<f64>>>()?;

    anyhow::ensure!(
        weights.len() == expected_len,
        "genome file {:?} has {} weights, expected {}",
        path,
        weights.len(),
        expected_len
    );

    Ok(Genome::new(weights))
}
