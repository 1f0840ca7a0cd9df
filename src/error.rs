//! Typed failure conditions surfaced to the invoking stage

use std::path::PathBuf;

use thiserror::Error;

/// Pipeline-level preconditions
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("input artifact '{}' does not exist", path.display())]
    MissingSource { path: PathBuf },
}

/// Conditions that make a clustering request unsatisfiable
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("number of clusters must be at least 1")]
    InvalidClusterCount,
    #[error("number of rows ({rows}) must be at least equal to number of clusters ({clusters})")]
    TooFewRows { rows: usize, clusters: usize },
}
