//! Tabular Q-learning brain
//!
//! Environment-agnostic: only ever sees `(state, valid_actions)`. The table
//! maps each state record to a fixed-size value row indexed by the closed
//! action enum; rows are lazily initialized to zero and never reset.

use std::collections::HashMap;
use std::marker::PhantomData;

use rand::rngs::ThreadRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::adapter::{Brain, Mode, TaskAction, TaskState};

/// Hyperparameters for the tabular Q-learning brain
///
/// Defaults match the values the training runs were tuned with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QLearningConfig {
    /// Learning rate alpha
    ///
    /// Default: 0.3
    pub alpha: f64,

    /// Discount factor gamma for future rewards
    ///
    /// Default: 0.95
    pub gamma: f64,

    /// Exploration probability in train mode
    ///
    /// Ignored entirely in test mode, which always acts greedily.
    ///
    /// Default: 0.2
    pub epsilon: f64,
}

impl Default for QLearningConfig {
    fn default() -> Self {
        Self {
            alpha: 0.3,
            gamma: 0.95,
            epsilon: 0.2,
        }
    }
}

impl QLearningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that all hyperparameters are in valid ranges
    pub fn validate(&self) -> Result<(), String> {
        if self.alpha <= 0.0 || self.alpha > 1.0 {
            return Err(format!("alpha must be in (0, 1], got {}", self.alpha));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(format!("gamma must be in [0, 1], got {}", self.gamma));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(format!("epsilon must be in [0, 1], got {}", self.epsilon));
        }
        Ok(())
    }
}

/// Generic tabular Q-learning brain
#[derive(Debug)]
pub struct QLearningBrain<S, A> {
    config: QLearningConfig,
    table: HashMap<S, Vec<f64>>,
    rng: ThreadRng,
    _actions: PhantomData<A>,
}

impl<S: TaskState, A: TaskAction> QLearningBrain<S, A> {
    pub fn new(config: QLearningConfig) -> Self {
        Self::with_table(config, HashMap::new())
    }

    /// Construct around an existing table (used when loading a policy)
    pub fn with_table(config: QLearningConfig, table: HashMap<S, Vec<f64>>) -> Self {
        Self {
            config,
            table,
            rng: rand::thread_rng(),
            _actions: PhantomData,
        }
    }

    pub fn config(&self) -> &QLearningConfig {
        &self.config
    }

    pub fn table(&self) -> &HashMap<S, Vec<f64>> {
        &self.table
    }

    /// Number of distinct states the table has seen
    pub fn states_seen(&self) -> usize {
        self.table.len()
    }

    /// Stored value for a state/action pair (0.0 if never seen)
    pub fn value(&self, state: &S, action: A) -> f64 {
        self.table
            .get(state)
            .map(|row| row[action.index()])
            .unwrap_or(0.0)
    }

    fn ensure_row(&mut self, state: &S) {
        if !self.table.contains_key(state) {
            self.table
                .insert(state.clone(), vec![0.0; A::ALL.len()]);
        }
    }

    fn greedy(&mut self, state: &S, valid_actions: &[A]) -> A {
        self.ensure_row(state);
        let row = &self.table[state];

        let best = valid_actions
            .iter()
            .map(|action| row[action.index()])
            .fold(f64::NEG_INFINITY, f64::max);

        // random tie-break among maximizers, to avoid directional bias
        let ties: Vec<A> = valid_actions
            .iter()
            .copied()
            .filter(|action| row[action.index()] == best)
            .collect();
        ties[self.rng.gen_range(0..ties.len())]
    }
}

impl<S: TaskState, A: TaskAction> Brain<S, A> for QLearningBrain<S, A> {
    fn select_action(&mut self, state: &S, valid_actions: &[A], mode: Mode) -> A {
        self.ensure_row(state);

        if mode == Mode::Train && self.rng.gen::<f64>() < self.config.epsilon {
            return valid_actions[self.rng.gen_range(0..valid_actions.len())];
        }

        self.greedy(state, valid_actions)
    }

    fn update(
        &mut self,
        prev_state: &S,
        action: A,
        reward: f64,
        new_state: &S,
        done: bool,
        next_valid_actions: Option<&[A]>,
    ) {
        self.ensure_row(prev_state);
        self.ensure_row(new_state);

        // Terminal states have zero continuation value; so does a dead end
        // with no legal successor actions.
        let q_next = if done {
            0.0
        } else {
            let next_row = &self.table[new_state];
            match next_valid_actions {
                Some(actions) if !actions.is_empty() => actions
                    .iter()
                    .map(|a| next_row[a.index()])
                    .fold(f64::NEG_INFINITY, f64::max),
                Some(_) => 0.0,
                None => next_row.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            }
        };

        let row = self
            .table
            .get_mut(prev_state)
            .expect("row was just ensured");
        let q_old = row[action.index()];
        row[action.index()] =
            q_old + self.config.alpha * (reward + self.config.gamma * q_next - q_old);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    enum TestAction {
        Stay,
        Go,
    }

    impl TaskAction for TestAction {
        const ALL: &'static [TestAction] = &[TestAction::Stay, TestAction::Go];

        fn index(self) -> usize {
            match self {
                TestAction::Stay => 0,
                TestAction::Go => 1,
            }
        }

        fn label(self) -> &'static str {
            match self {
                TestAction::Stay => "stay",
                TestAction::Go => "go",
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct CellState(u8);

    impl TaskState for CellState {
        fn encode(&self, out: &mut Vec<f64>) {
            out.push(self.0 as f64);
        }
    }

    type TestBrain = QLearningBrain<CellState, TestAction>;

    #[test]
    fn test_default_config_is_valid() {
        assert!(QLearningConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_ranges() {
        let mut config = QLearningConfig::default();
        config.alpha = 0.0;
        assert!(config.validate().is_err());

        let mut config = QLearningConfig::default();
        config.gamma = 1.5;
        assert!(config.validate().is_err());

        let mut config = QLearningConfig::default();
        config.epsilon = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_selection_stays_within_valid_actions() {
        let mut brain = TestBrain::new(QLearningConfig {
            epsilon: 0.5,
            ..Default::default()
        });

        // property check over random state/subset pairs
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let state = CellState(rng.gen_range(0..16));
            let valid: Vec<TestAction> = if rng.gen::<bool>() {
                vec![TestAction::Stay]
            } else if rng.gen::<bool>() {
                vec![TestAction::Go]
            } else {
                vec![TestAction::Stay, TestAction::Go]
            };

            let chosen = brain.select_action(&state, &valid, Mode::Train);
            assert!(valid.contains(&chosen));
        }
    }

    #[test]
    fn test_lazy_init_and_idempotent_reinit() {
        let mut brain = TestBrain::new(QLearningConfig::default());
        let state = CellState(3);

        assert_eq!(brain.states_seen(), 0);
        brain.select_action(&state, TestAction::ALL, Mode::Test);
        assert_eq!(brain.states_seen(), 1);
        assert_eq!(brain.value(&state, TestAction::Go), 0.0);

        brain.update(&state, TestAction::Go, 1.0, &CellState(4), true, None);
        let learned = brain.value(&state, TestAction::Go);
        assert!(learned > 0.0);

        // revisiting never resets the existing entry
        brain.select_action(&state, TestAction::ALL, Mode::Test);
        brain.update(&state, TestAction::Stay, 0.0, &CellState(4), true, None);
        assert_eq!(brain.value(&state, TestAction::Go), learned);
    }

    #[test]
    fn test_converges_on_one_step_task() {
        let mut brain = TestBrain::new(QLearningConfig {
            epsilon: 0.0,
            ..Default::default()
        });
        let start = CellState(0);
        let end = CellState(1);

        for _ in 0..50 {
            brain.update(&start, TestAction::Go, 1.0, &end, true, None);
            brain.update(&start, TestAction::Stay, 0.0, &end, true, None);
        }

        for _ in 0..20 {
            let chosen = brain.select_action(&start, TestAction::ALL, Mode::Train);
            assert_eq!(chosen, TestAction::Go);
        }
    }

    #[test]
    fn test_test_mode_ignores_epsilon() {
        let mut brain = TestBrain::new(QLearningConfig {
            epsilon: 1.0,
            ..Default::default()
        });
        let state = CellState(0);
        brain.update(&state, TestAction::Go, 1.0, &CellState(1), true, None);

        for _ in 0..20 {
            assert_eq!(
                brain.select_action(&state, TestAction::ALL, Mode::Test),
                TestAction::Go
            );
        }
    }

    #[test]
    fn test_update_bootstraps_from_next_valid_subset() {
        let mut brain = TestBrain::new(QLearningConfig {
            alpha: 1.0,
            gamma: 0.5,
            epsilon: 0.0,
        });
        let a = CellState(0);
        let b = CellState(1);

        // give the next state a high value on Go, low on Stay
        brain.update(&b, TestAction::Go, 2.0, &CellState(2), true, None);
        brain.update(&b, TestAction::Stay, 0.5, &CellState(2), true, None);

        // restricting the successor set to Stay must bootstrap off 0.5
        brain.update(&a, TestAction::Go, 0.0, &b, false, Some(&[TestAction::Stay]));
        assert!((brain.value(&a, TestAction::Go) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_terminal_update_has_no_continuation() {
        let mut brain = TestBrain::new(QLearningConfig {
            alpha: 1.0,
            gamma: 0.9,
            epsilon: 0.0,
        });
        let a = CellState(0);
        let b = CellState(1);

        brain.update(&b, TestAction::Go, 10.0, &CellState(2), true, None);
        brain.update(&a, TestAction::Go, 1.0, &b, true, None);

        // done == true: reward only, no bootstrapping off b's values
        assert!((brain.value(&a, TestAction::Go) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_next_valid_set_means_dead_end() {
        let mut brain = TestBrain::new(QLearningConfig {
            alpha: 1.0,
            gamma: 0.9,
            epsilon: 0.0,
        });
        let a = CellState(0);
        let b = CellState(1);

        brain.update(&b, TestAction::Go, 5.0, &CellState(2), true, None);
        brain.update(&a, TestAction::Go, 1.0, &b, false, Some(&[]));

        assert!((brain.value(&a, TestAction::Go) - 1.0).abs() < 1e-9);
    }
}
