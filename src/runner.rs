use std::time::{Duration, Instant};

use crate::algorithms::{Clara, KMedoids};
use crate::config::{Config, Method};
use crate::data::Matrix;
use crate::error::Result;
use crate::types::ClusterResult;
use crate::utils::UniformSelector;
use crate::Float;

/// Outcome of [`run`].
#[derive(Debug, Clone)]
pub struct RunSummary<T: Float> {
    pub clusters: ClusterResult<T>,
    /// Wall time spent in the clustering driver.
    pub elapsed: Duration,
}

/// Clusters `data` with the driver, mode and strategies named in `config`.
pub fn run<T: Float>(config: &Config, data: &Matrix<T>) -> Result<RunSummary<T>> {
    let mut selector = UniformSelector::new(config.seed);
    tracing::info!(
        method = ?config.method,
        mode = %config.mode,
        clusters = config.clusters,
        points = data.rows(),
        dims = data.cols(),
        seed = selector.seed(),
        "clustering started"
    );

    let start = Instant::now();
    let clusters = match config.method {
        Method::KMedoids => KMedoids::from_config(config)?.fit(
            data,
            config.clusters,
            config.repeats,
            &mut selector,
        )?,
        Method::Clara => Clara::from_config(config)?.fit(
            data,
            config.clusters,
            config.repeats,
            config.sampling_iterations,
            &mut selector,
        )?,
    };
    let elapsed = start.elapsed();

    tracing::info!(cost = ?clusters.cost, elapsed = ?elapsed, "clustering finished");
    Ok(RunSummary { clusters, elapsed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, ExecutionMode, SampleSize};

    fn grid() -> Matrix<f64> {
        let mut flat = Vec::new();
        for &(cx, cy) in [(0.0, 0.0), (50.0, 50.0)].iter() {
            for i in 0..25 {
                flat.push(cx + (i % 5) as f64);
                flat.push(cy + (i / 5) as f64);
            }
        }
        Matrix::from_flat(flat, 2).unwrap()
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let data = grid();
        let config = Config {
            initializer: "random".into(),
            repeats: 3,
            seed: Some(11),
            ..Config::default()
        };

        let a = run(&config, &data).unwrap();
        let b = run(&config, &data).unwrap();
        assert_eq!(a.clusters, b.clusters);
    }

    #[test]
    fn every_method_and_mode_separates_the_grids() {
        let data = grid();

        for &method in [Method::KMedoids, Method::Clara].iter() {
            for &mode in [
                ExecutionMode::Sequential,
                ExecutionMode::SharedMemoryParallel,
                ExecutionMode::DistributedMessagePassing,
                ExecutionMode::HybridParallel,
            ]
            .iter()
            {
                let config = Config {
                    method,
                    mode,
                    sample_size: SampleSize::Fixed(30),
                    seed: Some(5),
                    threads: Some(2),
                    workers: Some(2),
                    ..Config::default()
                };

                let summary = run(&config, &data).unwrap();
                let ids = &summary.clusters.assignments;
                assert!(ids[..25].iter().all(|&id| id == ids[0]), "{:?}/{}", method, mode);
                assert!(ids[25..].iter().all(|&id| id == ids[25]), "{:?}/{}", method, mode);
                assert_ne!(ids[0], ids[25]);
            }
        }
    }

    #[test]
    fn invalid_config_fails_before_clustering() {
        let data = grid();
        let config = Config {
            maximizer: "anneal".into(),
            ..Config::default()
        };
        assert!(matches!(run(&config, &data), Err(Error::InvalidConfiguration(_))));

        let config = Config {
            clusters: 51,
            ..Config::default()
        };
        assert!(matches!(run(&config, &data), Err(Error::InvalidConfiguration(_))));
    }
}
