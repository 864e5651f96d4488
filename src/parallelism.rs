use std::{fmt, str::FromStr, sync::Arc};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a run spreads its work. Chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    #[serde(alias = "serial")]
    Sequential,
    #[serde(alias = "shared", alias = "omp")]
    SharedMemoryParallel,
    #[serde(alias = "distributed", alias = "mpi")]
    DistributedMessagePassing,
    #[serde(alias = "hybrid")]
    HybridParallel,
}

impl ExecutionMode {
    /// Whether inner loops run on a thread pool.
    pub fn is_shared_memory(self) -> bool {
        matches!(
            self,
            ExecutionMode::SharedMemoryParallel | ExecutionMode::HybridParallel
        )
    }

    /// Whether CLARA sampling is farmed out to workers.
    pub fn is_distributed(self) -> bool {
        matches!(
            self,
            ExecutionMode::DistributedMessagePassing | ExecutionMode::HybridParallel
        )
    }

    /// Mode used for the loops inside a single distributed worker.
    pub fn worker_mode(self) -> ExecutionMode {
        match self {
            ExecutionMode::HybridParallel => ExecutionMode::SharedMemoryParallel,
            _ => ExecutionMode::Sequential,
        }
    }
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Sequential
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionMode::Sequential => "sequential",
            ExecutionMode::SharedMemoryParallel => "shared",
            ExecutionMode::DistributedMessagePassing => "distributed",
            ExecutionMode::HybridParallel => "hybrid",
        };
        f.write_str(name)
    }
}

impl FromStr for ExecutionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequential" | "serial" => Ok(ExecutionMode::Sequential),
            "shared" | "shared-memory-parallel" | "omp" => Ok(ExecutionMode::SharedMemoryParallel),
            "distributed" | "distributed-message-passing" | "mpi" => {
                Ok(ExecutionMode::DistributedMessagePassing)
            }
            "hybrid" | "hybrid-parallel" => Ok(ExecutionMode::HybridParallel),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown execution mode '{}'",
                other
            ))),
        }
    }
}

/// Capability handed to every algorithm: "parallel-for over a range with an
/// associative reduction". Loops read shared snapshots and write disjoint outputs.
#[derive(Clone)]
pub struct Executor {
    mode: ExecutionMode,
    pool: Option<Arc<ThreadPool>>,
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Executor")
            .field("mode", &self.mode)
            .field("threads", &self.num_threads())
            .finish()
    }
}

impl Executor {
    /// `threads` sizes the pool for the shared-memory modes; `None` lets rayon decide.
    pub fn new(mode: ExecutionMode, threads: Option<usize>) -> Result<Self> {
        if threads == Some(0) {
            return Err(Error::InvalidConfiguration(
                "thread count must be greater than zero".into(),
            ));
        }

        let pool = if mode.is_shared_memory() {
            let mut builder = ThreadPoolBuilder::new()
                .thread_name(|i| format!("medoids-worker-{}", i));
            if let Some(threads) = threads {
                builder = builder.num_threads(threads);
            }
            Some(Arc::new(builder.build()?))
        } else {
            None
        };

        Ok(Self { mode, pool })
    }

    pub fn sequential() -> Self {
        Self {
            mode: ExecutionMode::Sequential,
            pool: None,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn num_threads(&self) -> usize {
        self.pool.as_ref().map_or(1, |pool| pool.current_num_threads())
    }

    /// Executor for the loops of one distributed worker, sharing this pool.
    pub fn for_worker(&self) -> Self {
        let mode = self.mode.worker_mode();
        let pool = if mode.is_shared_memory() {
            self.pool.clone()
        } else {
            None
        };
        Self { mode, pool }
    }

    /// `f(i)` for every `i` in `0..len`, results in index order.
    pub fn map<R, F>(&self, len: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| (0..len).into_par_iter().map(f).collect()),
            None => (0..len).map(f).collect(),
        }
    }

    /// Writes `f(i)` into `out[i]`.
    pub fn fill<T, F>(&self, out: &mut [T], f: F)
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| {
                out.par_iter_mut()
                    .enumerate()
                    .for_each(|(i, slot)| *slot = f(i))
            }),
            None => out.iter_mut().enumerate().for_each(|(i, slot)| *slot = f(i)),
        }
    }

    /// Hands each `row_len`-wide row of `out` to `f` along with its row index.
    pub fn fill_rows<T, F>(&self, out: &mut [T], row_len: usize, f: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        if row_len == 0 {
            return;
        }

        match &self.pool {
            Some(pool) => pool.install(|| {
                out.par_chunks_exact_mut(row_len)
                    .enumerate()
                    .for_each(|(i, row)| f(i, row))
            }),
            None => out
                .chunks_exact_mut(row_len)
                .enumerate()
                .for_each(|(i, row)| f(i, row)),
        }
    }

    /// Folds `map(i)` over `0..len` with an associative, commutative `op`.
    pub fn reduce<R, M, Op>(&self, len: usize, identity: R, map: M, op: Op) -> R
    where
        R: Clone + Send + Sync,
        M: Fn(usize) -> R + Sync + Send,
        Op: Fn(R, R) -> R + Sync + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(|| {
                (0..len)
                    .into_par_iter()
                    .map(&map)
                    .reduce(|| identity.clone(), &op)
            }),
            None => (0..len).map(map).fold(identity, op),
        }
    }

    pub fn sum<T: crate::Float, F>(&self, len: usize, f: F) -> T
    where
        F: Fn(usize) -> T + Sync + Send,
    {
        self.reduce(len, T::zero(), f, |a, b| a + b)
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::sequential()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_names_round_trip() {
        for mode in [
            ExecutionMode::Sequential,
            ExecutionMode::SharedMemoryParallel,
            ExecutionMode::DistributedMessagePassing,
            ExecutionMode::HybridParallel,
        ]
        .iter()
        {
            assert_eq!(mode.to_string().parse::<ExecutionMode>().unwrap(), *mode);
        }

        assert_eq!("omp".parse::<ExecutionMode>().unwrap(), ExecutionMode::SharedMemoryParallel);
        assert_eq!("MPI".parse::<ExecutionMode>().unwrap(), ExecutionMode::DistributedMessagePassing);
        assert!("gpu".parse::<ExecutionMode>().is_err());
    }

    #[test]
    fn worker_mode_nests_shared_memory_only_for_hybrid() {
        assert_eq!(ExecutionMode::HybridParallel.worker_mode(), ExecutionMode::SharedMemoryParallel);
        assert_eq!(ExecutionMode::DistributedMessagePassing.worker_mode(), ExecutionMode::Sequential);
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(matches!(
            Executor::new(ExecutionMode::SharedMemoryParallel, Some(0)),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let parallel = Executor::new(ExecutionMode::SharedMemoryParallel, Some(4)).unwrap();
        let sequential = Executor::sequential();

        for exec in [parallel, sequential].iter() {
            assert_eq!(exec.map(5, |i| i * i), vec![0, 1, 4, 9, 16]);

            let mut out = vec![0usize; 6];
            exec.fill_rows(&mut out, 2, |row, cells| {
                cells[0] = row;
                cells[1] = row * 10;
            });
            assert_eq!(out, vec![0, 0, 1, 10, 2, 20]);

            let mut cells = vec![0usize; 4];
            exec.fill(&mut cells, |i| i + 1);
            assert_eq!(cells, vec![1, 2, 3, 4]);

            let total: f64 = exec.sum(101, |i| i as f64);
            assert_eq!(total, 5050.0);

            let max = exec.reduce(10, 0usize, |i| (i * 7) % 10, usize::max);
            assert_eq!(max, 9);
        }
    }
}
