use std::thread;

use super::distributed::{channel_transport, run_worker, Coordinator};
use super::*;
use crate::config::{Config, SampleSize};
use crate::data::Matrix;
use crate::types::{keep_best, ClusterResult};

/// Rows drawn from a larger dataset, remembering where each came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample<T> {
    /// Row of the full dataset behind each sampled row.
    pub indices: Vec<usize>,
    pub points: Matrix<T>,
}

impl<T: Float> Sample<T> {
    /// `size` distinct rows chosen uniformly without replacement.
    pub fn draw(data: &Matrix<T>, size: usize, selector: &mut UniformSelector) -> Result<Self> {
        let indices = selector.select(size, data.rows())?;
        let points = data.select_rows(&indices);
        Ok(Self { indices, points })
    }

    /// Maps sample-local row numbers back to full-dataset rows.
    pub fn global_indices(&self, local: &[usize]) -> Vec<usize> {
        local.iter().map(|&i| self.indices[i]).collect()
    }
}

/// CLARA: cluster small random samples, judge each sample's medoids on the whole
/// dataset, keep the best.
#[derive(Debug, Clone)]
pub struct Clara {
    kmedoids: KMedoids,
    sample_size: SampleSize,
    workers: Option<usize>,
}

impl Clara {
    pub fn new(kmedoids: KMedoids) -> Self {
        Self {
            kmedoids,
            sample_size: SampleSize::default(),
            workers: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(KMedoids::from_config(config)?)
            .with_sample_size(config.sample_size)
            .with_workers(config.workers))
    }

    pub fn with_sample_size(mut self, sample_size: SampleSize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Worker count for the distributed modes.
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn fit<T: Float>(
        &self,
        data: &Matrix<T>,
        num_clusters: usize,
        num_repeats: usize,
        num_sampling_iters: usize,
        selector: &mut UniformSelector,
    ) -> Result<ClusterResult<T>> {
        validate_fit(data.rows(), num_clusters, num_repeats)?;
        if num_sampling_iters == 0 {
            return Err(Error::InvalidConfiguration(
                "number of sampling iterations must be at least 1".into(),
            ));
        }

        let sample_size = self.sample_size.resolve(data.rows(), num_clusters);
        if sample_size < num_clusters {
            return Err(Error::InvalidConfiguration(format!(
                "sample of {} points cannot hold {} medoids",
                sample_size, num_clusters
            )));
        }

        let executor = self.kmedoids.executor();
        if executor.mode().is_distributed() {
            self.fit_distributed(data, num_clusters, num_repeats, num_sampling_iters, sample_size, selector)
        } else {
            self.fit_shared(data, num_clusters, num_repeats, num_sampling_iters, sample_size, selector)
        }
    }

    fn fit_shared<T: Float>(
        &self,
        data: &Matrix<T>,
        num_clusters: usize,
        num_repeats: usize,
        num_sampling_iters: usize,
        sample_size: usize,
        selector: &mut UniformSelector,
    ) -> Result<ClusterResult<T>> {
        let mut best = None;

        for iteration in 0..num_sampling_iters {
            let sample = Sample::draw(data, sample_size, selector)?;
            let local = self.kmedoids.fit(&sample.points, num_clusters, num_repeats, selector)?;

            let candidate = ClusterResult::evaluate(
                data,
                local.medoids,
                sample.global_indices(&local.medoid_indices),
                self.kmedoids.dissimilarity(),
                self.kmedoids.executor(),
            );
            let cost = candidate.cost;
            if keep_best(&mut best, candidate) {
                tracing::debug!(iteration, cost = ?cost, "sample is the new best");
            }
        }

        best.ok_or_else(|| Error::InvalidConfiguration("no samples were drawn".into()))
    }

    /// The calling thread coordinates; each worker gets its own thread, transport
    /// endpoint and forked selector.
    fn fit_distributed<T: Float>(
        &self,
        data: &Matrix<T>,
        num_clusters: usize,
        num_repeats: usize,
        num_sampling_iters: usize,
        sample_size: usize,
        selector: &mut UniformSelector,
    ) -> Result<ClusterResult<T>> {
        let num_workers = self.workers.unwrap_or_else(default_workers);
        if num_workers == 0 {
            return Err(Error::InvalidConfiguration(
                "distributed mode needs at least one worker".into(),
            ));
        }

        let executor = self.kmedoids.executor();
        let worker_kmedoids = self.kmedoids.clone().with_executor(executor.for_worker());
        let worker_selectors: Vec<_> = (0..num_workers).map(|_| selector.fork()).collect();
        let (endpoint, worker_endpoints) = channel_transport::<T>(num_workers);

        tracing::debug!(
            workers = num_workers,
            sample_size,
            iterations = num_sampling_iters,
            "starting distributed clara"
        );

        thread::scope(|scope| {
            let handles: Vec<_> = worker_endpoints
                .into_iter()
                .zip(worker_selectors)
                .map(|(worker, mut worker_selector)| {
                    let kmedoids = &worker_kmedoids;
                    scope.spawn(move || {
                        run_worker(&worker, kmedoids, num_clusters, num_repeats, &mut worker_selector)
                    })
                })
                .collect();

            let coordinator = Coordinator {
                data,
                sample_size,
                sampling_iterations: num_sampling_iters,
                dissimilarity: self.kmedoids.dissimilarity(),
                executor,
            };
            let outcome = coordinator.run(&endpoint, selector);
            // Hang up so workers blocked on a receive see the coordinator is gone.
            drop(endpoint);

            let mut worker_error = None;
            for handle in handles {
                let joined = handle
                    .join()
                    .map_err(|_| Error::Protocol("worker thread panicked".into()))
                    .and_then(|r| r);
                if let Err(err) = joined {
                    worker_error.get_or_insert(err);
                }
            }

            let best = outcome?;
            match worker_error {
                Some(err) => Err(err),
                None => Ok(best),
            }
        })
    }
}

fn default_workers() -> usize {
    thread::available_parallelism().map_or(1, |n| n.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Dissimilarity;
    use crate::ExecutionMode;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn blobs(seed: u64, per_blob: usize) -> Matrix<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let centers = [(0.0, 0.0), (30.0, 0.0), (0.0, 30.0), (30.0, 30.0)];
        let mut flat = Vec::new();
        for &(cx, cy) in centers.iter() {
            for _ in 0..per_blob {
                flat.push(cx + rng.gen_range(-2.0..2.0));
                flat.push(cy + rng.gen_range(-2.0..2.0));
            }
        }
        Matrix::from_flat(flat, 2).unwrap()
    }

    fn clara(mode: ExecutionMode, workers: Option<usize>) -> Clara {
        let kmedoids = KMedoids::new("greedy-build", "swap")
            .unwrap()
            .with_executor(Executor::new(mode, Some(2)).unwrap());
        Clara::new(kmedoids).with_workers(workers)
    }

    fn assert_valid(result: &ClusterResult<f64>, data: &Matrix<f64>, k: usize) {
        let mut medoids = result.medoid_indices.clone();
        medoids.sort_unstable();
        medoids.dedup();
        assert_eq!(medoids.len(), k);
        assert!(medoids.iter().all(|&m| m < data.rows()));
        assert_eq!(result.assignments.len(), data.rows());
        assert!(result.assignments.iter().all(|&a| a < k));

        for (slot, &idx) in result.medoid_indices.iter().enumerate() {
            assert_eq!(result.medoids.row(slot), data.row(idx));
        }
    }

    #[test]
    fn sample_rows_come_from_the_dataset() {
        let data = blobs(1, 25);
        let sample = Sample::draw(&data, 20, &mut UniformSelector::new(Some(4))).unwrap();

        assert_eq!(sample.points.rows(), 20);
        for (row, &idx) in sample.indices.iter().enumerate() {
            assert_eq!(sample.points.row(row), data.row(idx));
        }
        assert_eq!(sample.global_indices(&[0, 19]), vec![sample.indices[0], sample.indices[19]]);
    }

    #[test]
    fn evaluates_on_the_full_dataset() {
        let data = blobs(2, 40);
        let result = clara(ExecutionMode::Sequential, None)
            .fit(&data, 4, 1, 4, &mut UniformSelector::new(Some(2)))
            .unwrap();

        assert_valid(&result, &data, 4);

        let recomputed = ClusterResult::evaluate(
            &data,
            result.medoids.clone(),
            result.medoid_indices.clone(),
            Dissimilarity::L2,
            &Executor::sequential(),
        );
        assert_eq!(recomputed.cost, result.cost);
        assert_eq!(recomputed.assignments, result.assignments);
    }

    /// Four 3x3 grids far apart; the grid centres are the unique best medoids.
    fn grids() -> Matrix<f64> {
        let mut flat = Vec::new();
        for &(cx, cy) in [(0.0, 0.0), (30.0, 0.0), (0.0, 30.0), (30.0, 30.0)].iter() {
            for i in 0..9 {
                flat.push(cx + (i % 3) as f64);
                flat.push(cy + (i / 3) as f64);
            }
        }
        Matrix::from_flat(flat, 2).unwrap()
    }

    #[test]
    fn never_beats_exhaustive_search() {
        let data = grids();
        let full = ["greedy-build", "random"]
            .iter()
            .map(|init| {
                KMedoids::new(init, "swap")
                    .unwrap()
                    .fit(&data, 4, 10, &mut UniformSelector::new(Some(3)))
                    .unwrap()
                    .cost
            })
            .fold(f64::INFINITY, f64::min);

        for seed in 0..5 {
            let sampled = clara(ExecutionMode::Sequential, None)
                .with_sample_size(SampleSize::Fixed(20))
                .fit(&data, 4, 1, 3, &mut UniformSelector::new(Some(seed)))
                .unwrap();
            assert!(sampled.cost >= full - 1e-9, "seed {}", seed);
        }
    }

    #[test]
    fn rejects_samples_smaller_than_k() {
        let data = blobs(4, 10);
        let result = clara(ExecutionMode::Sequential, None)
            .with_sample_size(SampleSize::Fixed(3))
            .fit(&data, 4, 1, 2, &mut UniformSelector::new(Some(4)));
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));

        let result = clara(ExecutionMode::Sequential, None).fit(&data, 4, 1, 0, &mut UniformSelector::new(Some(4)));
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn distributed_modes_produce_valid_results() {
        let data = blobs(5, 30);

        for &(mode, workers) in [
            (ExecutionMode::DistributedMessagePassing, Some(3)),
            (ExecutionMode::HybridParallel, Some(2)),
            (ExecutionMode::DistributedMessagePassing, Some(8)),
        ]
        .iter()
        {
            let result = clara(mode, workers)
                .fit(&data, 4, 1, 5, &mut UniformSelector::new(Some(5)))
                .unwrap();
            assert_valid(&result, &data, 4);
        }
    }

    #[test]
    fn shared_memory_clara_is_reproducible() {
        let data = blobs(6, 30);
        let a = clara(ExecutionMode::SharedMemoryParallel, None)
            .fit(&data, 4, 2, 3, &mut UniformSelector::new(Some(6)))
            .unwrap();
        let b = clara(ExecutionMode::Sequential, None)
            .fit(&data, 4, 2, 3, &mut UniformSelector::new(Some(6)))
            .unwrap();

        assert_eq!(a.medoid_indices, b.medoid_indices);
        assert_eq!(a.assignments, b.assignments);
    }
}
