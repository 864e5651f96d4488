use serde::{Deserialize, Serialize};

use crate::algorithms::{InitializerKind, MaximizerKind};
use crate::error::{Error, Result};
use crate::measure::Dissimilarity;
use crate::parallelism::ExecutionMode;

/// Which driver a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    /// Restarts over the full dataset.
    #[serde(alias = "reg")]
    KMedoids,
    /// Repeated sub-sampling.
    Clara,
}

impl Default for Method {
    fn default() -> Self {
        Method::KMedoids
    }
}

/// CLARA sample size as a function of the dataset size `n` and cluster count `k`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SampleSize {
    /// `40 + 2k`.
    Default,
    Fixed(usize),
    #[serde(skip)]
    Custom(fn(usize, usize) -> usize),
}

impl SampleSize {
    /// The requested size, capped at `n`.
    pub fn resolve(self, num_points: usize, num_clusters: usize) -> usize {
        let size = match self {
            SampleSize::Default => 40 + 2 * num_clusters,
            SampleSize::Fixed(size) => size,
            SampleSize::Custom(f) => f(num_points, num_clusters),
        };
        size.min(num_points)
    }
}

impl Default for SampleSize {
    fn default() -> Self {
        SampleSize::Default
    }
}

/// Everything the core needs at construction time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub method: Method,
    pub mode: ExecutionMode,
    pub dissimilarity: Dissimilarity,
    pub initializer: String,
    pub maximizer: String,
    /// Number of medoids, K.
    pub clusters: usize,
    /// Restarts per fit (per sample for CLARA).
    pub repeats: usize,
    pub sampling_iterations: usize,
    pub sample_size: SampleSize,
    /// Wall-clock seeded when absent.
    pub seed: Option<u64>,
    /// Shared-memory pool size.
    pub threads: Option<usize>,
    /// Distributed worker count; defaults to the available parallelism.
    pub workers: Option<usize>,
    pub max_swap_passes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method: Method::default(),
            mode: ExecutionMode::default(),
            dissimilarity: Dissimilarity::default(),
            initializer: InitializerKind::GreedyBuild.to_string(),
            maximizer: MaximizerKind::Swap.to_string(),
            clusters: 2,
            repeats: 1,
            sampling_iterations: 5,
            sample_size: SampleSize::default(),
            seed: None,
            threads: None,
            workers: None,
            max_swap_passes: 1000,
        }
    }
}

impl Config {
    /// Rejects every data-independent misconfiguration.
    pub fn validate(&self) -> Result<()> {
        self.initializer.parse::<InitializerKind>()?;
        self.maximizer.parse::<MaximizerKind>()?;

        if self.clusters == 0 {
            return Err(Error::InvalidConfiguration(
                "clusters must be greater than zero".into(),
            ));
        }
        if self.repeats == 0 {
            return Err(Error::InvalidConfiguration(
                "repeats must be at least 1".into(),
            ));
        }
        if self.method == Method::Clara && self.sampling_iterations == 0 {
            return Err(Error::InvalidConfiguration(
                "sampling-iterations must be at least 1".into(),
            ));
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidConfiguration(
                "threads must be greater than zero".into(),
            ));
        }
        if self.workers == Some(0) {
            return Err(Error::InvalidConfiguration(
                "workers must be greater than zero".into(),
            ));
        }
        if matches!(self.sample_size, SampleSize::Fixed(0)) {
            return Err(Error::InvalidConfiguration(
                "sample-size must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
