use thiserror::Error;

/// Errors produced while configuring or running a clustering.
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected before any data is touched, or at the start of `fit` for data-dependent checks.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A fixed-capacity container was asked to hold more than it can.
    #[error("capacity exceeded: container holds at most {capacity} entries")]
    CapacityExceeded { capacity: usize },

    #[error("index {index} is out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Unexpected message or vanished peer between coordinator and workers.
    #[error("distributed protocol violation: {0}")]
    Protocol(String),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
