//! Recurrent genome brain
//!
//! A fixed-topology network with one recurrent hidden layer, parameterized
//! entirely by a flat weight vector. It never learns online; the
//! evolutionary trainer scores and mutates genomes externally.

use rand::Rng;

use super::adapter::{Brain, Mode, TaskAction, TaskState};
use super::error::LearningError;

/// Flat ordered weight vector fully determining one recurrent controller
///
/// Layout: input→hidden block, hidden→hidden recurrent block, then
/// hidden→output block; no bias terms.
#[derive(Debug, Clone, PartialEq)]
pub struct Genome {
    weights: Vec<f64>,
}

impl Genome {
    pub fn new(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    /// Expected weight count for the given dimensions
    pub fn expected_len(inputs: usize, hidden: usize, outputs: usize) -> usize {
        inputs * hidden + hidden * hidden + hidden * outputs
    }

    /// Uniform random genome in [-1, 1]
    pub fn random<R: Rng>(rng: &mut R, len: usize) -> Self {
        Self {
            weights: (0..len).map(|_| rng.gen_range(-1.0..=1.0)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Recurrent neural controller evolved by fitness/novelty
///
/// The hidden vector is the sole memory channel across steps within an
/// episode; it is zeroed by `reset` before the first decision.
#[derive(Debug)]
pub struct RecurrentBrain {
    inputs: usize,
    hidden_size: usize,
    outputs: usize,
    w_in: Vec<Vec<f64>>,
    w_rec: Vec<Vec<f64>>,
    w_out: Vec<Vec<f64>>,
    hidden: Vec<f64>,
    genome: Genome,
}

impl RecurrentBrain {
    /// Build a brain from a genome, failing fast on a length mismatch
    pub fn new(
        genome: Genome,
        inputs: usize,
        hidden: usize,
        outputs: usize,
    ) -> Result<Self, LearningError> {
        let expected = Genome::expected_len(inputs, hidden, outputs);
        if genome.len() != expected {
            return Err(LearningError::GenomeSize {
                inputs,
                hidden,
                outputs,
                expected,
                actual: genome.len(),
            });
        }
        Ok(Self::unpack(genome, inputs, hidden, outputs))
    }

    /// Build a brain around a fresh random genome
    pub fn random<R: Rng>(rng: &mut R, inputs: usize, hidden: usize, outputs: usize) -> Self {
        let genome = Genome::random(rng, Genome::expected_len(inputs, hidden, outputs));
        Self::unpack(genome, inputs, hidden, outputs)
    }

    fn unpack(genome: Genome, inputs: usize, hidden: usize, outputs: usize) -> Self {
        let g = genome.weights();
        let mut p = 0;

        let mut w_in = Vec::with_capacity(hidden);
        for _ in 0..hidden {
            w_in.push(g[p..p + inputs].to_vec());
            p += inputs;
        }

        let mut w_rec = Vec::with_capacity(hidden);
        for _ in 0..hidden {
            w_rec.push(g[p..p + hidden].to_vec());
            p += hidden;
        }

        let mut w_out = Vec::with_capacity(outputs);
        for _ in 0..outputs {
            w_out.push(g[p..p + hidden].to_vec());
            p += hidden;
        }

        Self {
            inputs,
            hidden_size: hidden,
            outputs,
            w_in,
            w_rec,
            w_out,
            hidden: vec![0.0; hidden],
            genome,
        }
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn outputs(&self) -> usize {
        self.outputs
    }

    /// One decision step: update the hidden vector and return the raw
    /// output scores, positionally aligned to the canonical action order
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        debug_assert_eq!(input.len(), self.inputs);

        let mut new_hidden = vec![0.0; self.hidden_size];
        for h in 0..self.hidden_size {
            let mut sum = 0.0;
            for i in 0..self.inputs {
                sum += input[i] * self.w_in[h][i];
            }
            for j in 0..self.hidden_size {
                sum += self.hidden[j] * self.w_rec[h][j];
            }
            new_hidden[h] = sum.tanh();
        }
        self.hidden = new_hidden;

        (0..self.outputs)
            .map(|o| {
                (0..self.hidden_size)
                    .map(|h| self.hidden[h] * self.w_out[o][h])
                    .sum()
            })
            .collect()
    }
}

impl<S: TaskState, A: TaskAction> Brain<S, A> for RecurrentBrain {
    fn select_action(&mut self, state: &S, valid_actions: &[A], _mode: Mode) -> A {
        let mut features = Vec::with_capacity(self.inputs);
        state.encode(&mut features);
        let scores = self.forward(&features);

        // Scores align to the canonical action vocabulary the network was
        // evolved against, not to the order of the valid subset.
        valid_actions
            .iter()
            .copied()
            .max_by(|a, b| scores[a.index()].total_cmp(&scores[b.index()]))
            .expect("select_action requires a non-empty valid action set")
    }

    fn reset(&mut self) {
        self.hidden.iter_mut().for_each(|h| *h = 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::maze::MazeAction;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct UnitState;

    impl TaskState for UnitState {
        fn encode(&self, out: &mut Vec<f64>) {
            out.push(1.0);
        }
    }

    #[test]
    fn test_expected_len() {
        // 12 inputs, 6 hidden, 4 outputs: 72 + 36 + 24
        assert_eq!(Genome::expected_len(12, 6, 4), 132);
    }

    #[test]
    fn test_length_mismatch_fails_fast() {
        let genome = Genome::new(vec![0.0; 10]);
        let err = RecurrentBrain::new(genome, 12, 6, 4).unwrap_err();
        match err {
            LearningError::GenomeSize {
                expected, actual, ..
            } => {
                assert_eq!(expected, 132);
                assert_eq!(actual, 10);
            }
            other => panic!("expected GenomeSize, got {:?}", other),
        }
    }

    #[test]
    fn test_forward_is_deterministic_across_resets() {
        let mut rng = rand::thread_rng();
        let mut brain = RecurrentBrain::random(&mut rng, 3, 4, 2);

        let inputs = [
            vec![1.0, 0.0, 0.5],
            vec![0.0, 1.0, 0.0],
            vec![0.25, 0.25, 0.25],
        ];

        let run = |brain: &mut RecurrentBrain| -> Vec<Vec<f64>> {
            <RecurrentBrain as Brain<UnitState, MazeAction>>::reset(brain);
            inputs.iter().map(|input| brain.forward(input)).collect()
        };

        let first = run(&mut brain);
        let second = run(&mut brain);
        assert_eq!(first, second);
    }

    #[test]
    fn test_hidden_state_carries_within_episode() {
        // one input, one hidden unit, one output; recurrent weight 1.0
        let genome = Genome::new(vec![1.0, 1.0, 1.0]);
        let mut brain = RecurrentBrain::new(genome, 1, 1, 1).unwrap();

        let first = brain.forward(&[1.0])[0];
        let second = brain.forward(&[1.0])[0];
        // the second step feeds the first step's hidden value back in
        assert!(second > first);

        <RecurrentBrain as Brain<UnitState, MazeAction>>::reset(&mut brain);
        let after_reset = brain.forward(&[1.0])[0];
        assert_eq!(after_reset, first);
    }

    #[test]
    fn test_selection_aligns_scores_to_action_identity() {
        // 1 input, 1 hidden, 4 outputs. Saturating input weight makes the
        // hidden unit ~1, so outputs are effectively the readout weights:
        // strongly favoring index 0 (Up), then [1.0, 2.0, 3.0].
        let genome = Genome::new(vec![10.0, 0.0, 5.0, 1.0, 2.0, 3.0]);
        let mut brain = RecurrentBrain::new(genome, 1, 1, 4).unwrap();

        let valid = [MazeAction::Left, MazeAction::Right];
        let chosen =
            <RecurrentBrain as Brain<UnitState, MazeAction>>::select_action(
                &mut brain,
                &UnitState,
                &valid,
                Mode::Test,
            );

        // Right's aligned score (index 3) beats Left's (index 2); selecting
        // by position within the valid list would have produced Left.
        assert_eq!(chosen, MazeAction::Right);
    }

    #[test]
    fn test_selection_stays_within_valid_actions() {
        let mut rng = rand::thread_rng();
        let mut brain = RecurrentBrain::random(&mut rng, 1, 3, 4);

        for _ in 0..100 {
            let mut valid: Vec<MazeAction> = MazeAction::ALL
                .iter()
                .copied()
                .filter(|_| rng.gen::<bool>())
                .collect();
            if valid.is_empty() {
                valid.push(MazeAction::Up);
            }

            let chosen = <RecurrentBrain as Brain<UnitState, MazeAction>>::select_action(
                &mut brain,
                &UnitState,
                &valid,
                Mode::Train,
            );
            assert!(valid.contains(&chosen));
        }
    }
}
