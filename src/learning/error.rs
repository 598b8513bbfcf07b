use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by brain construction and policy persistence
///
/// Configuration mismatches fail fast and are never papered over by
/// truncating or padding; missing artifacts point the user at training.
#[derive(Debug, Error)]
pub enum LearningError {
    #[error(
        "genome has {actual} weights but {inputs} inputs, {hidden} hidden and \
         {outputs} outputs require {expected}"
    )]
    GenomeSize {
        inputs: usize,
        hidden: usize,
        outputs: usize,
        expected: usize,
        actual: usize,
    },

    #[error("policy file {path:?} not found — train first")]
    PolicyNotFound { path: PathBuf },

    #[error("genome file {path:?} not found — train first")]
    GenomeNotFound { path: PathBuf },

    #[error("policy file {path:?} uses format version {found}, expected {expected}")]
    PolicyVersion {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error(
        "policy file {path:?} was trained with actions {found:?}, expected {expected:?}"
    )]
    ActionSetMismatch {
        path: PathBuf,
        found: Vec<String>,
        expected: Vec<String>,
    },
}
