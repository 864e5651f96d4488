mod build;
mod clara;
pub mod distributed;
mod kmedoids;
mod random;
mod swap;

pub use self::build::*;
pub use self::clara::*;
pub use self::kmedoids::*;
pub use self::random::*;
pub use self::swap::*;

use std::{fmt, str::FromStr};

use crate::error::{Error, Result};
use crate::parallelism::Executor;
use crate::types::Clustering;
use crate::utils::UniformSelector;
use crate::Float;

/// Fills an empty [`Clustering`] with its initial medoids.
pub trait Initializer<T: Float> {
    fn initialize(
        &self,
        clustering: &mut Clustering<'_, T>,
        selector: &mut UniformSelector,
        executor: &Executor,
    ) -> Result<()>;
}

/// Improves a full medoid set in place. Returns the number of swaps performed.
pub trait Maximizer<T: Float> {
    fn maximize(&self, clustering: &mut Clustering<'_, T>, executor: &Executor) -> Result<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializerKind {
    Random,
    GreedyBuild,
}

impl InitializerKind {
    pub fn initialize<T: Float>(
        self,
        clustering: &mut Clustering<'_, T>,
        selector: &mut UniformSelector,
        executor: &Executor,
    ) -> Result<()> {
        match self {
            InitializerKind::Random => RandomInit.initialize(clustering, selector, executor),
            InitializerKind::GreedyBuild => PamBuild.initialize(clustering, selector, executor),
        }
    }
}

impl fmt::Display for InitializerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitializerKind::Random => f.write_str("random"),
            InitializerKind::GreedyBuild => f.write_str("greedy-build"),
        }
    }
}

impl FromStr for InitializerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(InitializerKind::Random),
            "greedy-build" | "build" | "pam_build" | "pam-build" => Ok(InitializerKind::GreedyBuild),
            other => Err(Error::InvalidConfiguration(format!(
                "unrecognized initializer '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaximizerKind {
    Swap,
}

impl fmt::Display for MaximizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaximizerKind::Swap => f.write_str("swap"),
        }
    }
}

impl FromStr for MaximizerKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "swap" | "pam_swap" | "pam-swap" => Ok(MaximizerKind::Swap),
            other => Err(Error::InvalidConfiguration(format!(
                "unrecognized maximizer '{}'",
                other
            ))),
        }
    }
}
