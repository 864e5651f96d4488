use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{Error, Result};

/// Draws distinct indices uniformly at random from an owned, seedable generator.
#[derive(Debug, Clone)]
pub struct UniformSelector {
    seed: u64,
    rng: ChaCha8Rng,
}

impl UniformSelector {
    /// Seeds from `seed`, or from the wall clock (microseconds) when absent.
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(wall_clock_seed);
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// `sample_size` distinct indices in `[0, container_size)`, in ascending order.
    pub fn select(&mut self, sample_size: usize, container_size: usize) -> Result<Vec<usize>> {
        if sample_size > container_size {
            return Err(Error::InvalidConfiguration(format!(
                "cannot select {} distinct indices out of {}",
                sample_size, container_size
            )));
        }

        let mut selections = BTreeSet::new();
        while selections.len() < sample_size {
            selections.insert(self.rng.gen_range(0..container_size));
        }

        Ok(selections.into_iter().collect())
    }

    /// An independent selector seeded from this one's stream.
    pub fn fork(&mut self) -> Self {
        Self::new(Some(self.rng.next_u64()))
    }
}

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_micros() as u64)
        .unwrap_or_default()
}
