use thiserror::Error;

/// Malformed input, detected before a model is ever handed to a solver.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidModelError {
    #[error("a bed needs at least one plant kind")]
    NoPlantKinds,

    #[error("plant kind `{name}` has min {min} greater than max {max}")]
    InvertedBounds { name: String, min: u32, max: u32 },

    #[error("plant kind `{0}` is declared more than once")]
    DuplicateName(String),

    #[error("cost matrix has {found} rows, expected {expected}")]
    CostRows { expected: usize, found: usize },

    #[error("cost matrix row {row} has {found} columns, expected {expected}")]
    CostColumns {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("cost matrix entry [{row}][{column}] is not a finite number")]
    NonFiniteCost { row: usize, column: usize },
}

/// The optimizer could not be run to completion.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("the model is unbounded")]
    Unbounded,

    #[error("solver backend failed: {0}")]
    Backend(String),

    #[error("solver stopped without an optimal solution: {0}")]
    Stopped(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    #[error(transparent)]
    InvalidModel(#[from] InvalidModelError),

    #[error(transparent)]
    Solver(#[from] SolverError),
}
