//! Map/scenario descriptions
//!
//! Scenarios are flat JSON records: grid dimensions, goal cells, obstacle
//! cells, and named start positions. The learning core never sees these —
//! it only works with the [`World`] and agent bodies built from them.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::world::{Position, SensorMode, World};

/// A scenario record loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapSpec {
    pub height: i32,
    pub width: i32,
    pub goals: Vec<Position>,
    pub obstacles: Vec<Position>,
    pub start_positions: BTreeMap<String, Position>,
}

impl MapSpec {
    /// Load and validate a scenario from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read map file {:?}", path))?;
        let spec: MapSpec = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse map file {:?}", path))?;
        spec.validate()
            .map_err(|msg| anyhow::anyhow!("Invalid map {:?}: {}", path, msg))?;
        Ok(spec)
    }

    /// Write the scenario as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize map")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write map file {:?}", path))
    }

    /// Check structural consistency of the scenario
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.height <= 0 || self.width <= 0 {
            return Err(format!(
                "grid dimensions must be positive, got {}x{}",
                self.height, self.width
            ));
        }

        if self.goals.is_empty() {
            return Err("map must declare at least one goal cell".to_string());
        }

        if self.start_positions.is_empty() {
            return Err("map must declare at least one start position".to_string());
        }

        let in_bounds = |pos: &Position| {
            pos.row >= 0 && pos.row < self.height && pos.col >= 0 && pos.col < self.width
        };

        for goal in &self.goals {
            if !in_bounds(goal) {
                return Err(format!("goal ({}, {}) is out of bounds", goal.row, goal.col));
            }
            if self.obstacles.contains(goal) {
                return Err(format!(
                    "goal ({}, {}) is also an obstacle",
                    goal.row, goal.col
                ));
            }
        }

        for (name, start) in &self.start_positions {
            if !in_bounds(start) {
                return Err(format!(
                    "start position '{}' ({}, {}) is out of bounds",
                    name, start.row, start.col
                ));
            }
            if self.obstacles.contains(start) {
                return Err(format!(
                    "start position '{}' ({}, {}) is on an obstacle",
                    name, start.row, start.col
                ));
            }
        }

        Ok(())
    }

    /// Build a world with this scenario's layout and the given sensor mode
    pub fn build_world(&self, mode: SensorMode) -> World {
        World::new(
            self.height,
            self.width,
            self.goals.clone(),
            self.obstacles.iter().copied().collect(),
            mode,
        )
    }

    /// Look up a named start position
    pub fn start(&self, name: &str) -> Option<Position> {
        self.start_positions.get(name).copied()
    }

    /// The first start position in name order
    ///
    /// Convenient for single-agent training runs that don't care which
    /// named spawn they use.
    pub fn first_start(&self) -> Option<Position> {
        self.start_positions.values().next().copied()
    }
}
