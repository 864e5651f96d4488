use super::*;
use crate::config::Config;
use crate::data::Matrix;
use crate::measure::{matrix::DistanceMatrix, Dissimilarity};
use crate::types::{keep_best, ClusterResult};

/// Restart driver: runs independent initialize + maximize restarts over one
/// distance table and keeps the cheapest result.
#[derive(Debug, Clone)]
pub struct KMedoids {
    initializer: InitializerKind,
    maximizer: MaximizerKind,
    dissimilarity: Dissimilarity,
    swap: PamSwap,
    executor: Executor,
}

impl KMedoids {
    /// Fails on unrecognized strategy names before any data is seen.
    pub fn new(initializer: &str, maximizer: &str) -> Result<Self> {
        Ok(Self {
            initializer: initializer.parse()?,
            maximizer: maximizer.parse()?,
            dissimilarity: Dissimilarity::default(),
            swap: PamSwap::default(),
            executor: Executor::sequential(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        Ok(Self::new(&config.initializer, &config.maximizer)?
            .with_dissimilarity(config.dissimilarity)
            .with_max_swap_passes(config.max_swap_passes)
            .with_executor(Executor::new(config.mode, config.threads)?))
    }

    pub fn with_dissimilarity(mut self, dissimilarity: Dissimilarity) -> Self {
        self.dissimilarity = dissimilarity;
        self
    }

    pub fn with_max_swap_passes(mut self, max_passes: usize) -> Self {
        self.swap = PamSwap::new(max_passes);
        self
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executor = executor;
        self
    }

    pub fn dissimilarity(&self) -> Dissimilarity {
        self.dissimilarity
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Best of `num_repeats` restarts. Ties keep the earlier restart.
    pub fn fit<T: Float>(
        &self,
        data: &Matrix<T>,
        num_clusters: usize,
        num_repeats: usize,
        selector: &mut UniformSelector,
    ) -> Result<ClusterResult<T>> {
        validate_fit(data.rows(), num_clusters, num_repeats)?;

        let mut distances = DistanceMatrix::build(data, num_clusters, self.dissimilarity, &self.executor);
        let mut best = None;

        for restart in 0..num_repeats {
            let result = self.restart(data, &mut distances, selector)?;
            let cost = result.cost;
            if keep_best(&mut best, result) {
                tracing::debug!(restart, cost = ?cost, "restart is the new best");
            }
        }

        best.ok_or_else(|| Error::InvalidConfiguration("no restarts were run".into()))
    }

    fn restart<T: Float>(
        &self,
        data: &Matrix<T>,
        distances: &mut DistanceMatrix<T>,
        selector: &mut UniformSelector,
    ) -> Result<ClusterResult<T>> {
        let mut clustering = Clustering::new(data, distances);
        self.initializer
            .initialize(&mut clustering, selector, &self.executor)?;

        match self.maximizer {
            MaximizerKind::Swap => self.swap.maximize(&mut clustering, &self.executor)?,
        };

        Ok(clustering.finish(&self.executor))
    }
}

pub(crate) fn validate_fit(num_points: usize, num_clusters: usize, num_repeats: usize) -> Result<()> {
    if num_clusters == 0 {
        return Err(Error::InvalidConfiguration(
            "number of clusters must be greater than zero".into(),
        ));
    }
    if num_clusters > num_points {
        return Err(Error::InvalidConfiguration(format!(
            "dataset has {} points but {} clusters were requested",
            num_points, num_clusters
        )));
    }
    if num_repeats == 0 {
        return Err(Error::InvalidConfiguration(
            "number of repeats must be at least 1".into(),
        ));
    }
    Ok(())
}
