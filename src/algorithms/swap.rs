use super::*;
use crate::utils::two_lowest;

const MAX_ITER: usize = 1000;

/// PAM SWAP local search. Every pass scores all (medoid slot, candidate) pairs
/// against the same snapshot and performs only the single best swap.
#[derive(Debug, Clone, Copy)]
pub struct PamSwap {
    max_passes: usize,
}

impl PamSwap {
    pub fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }
}

impl Default for PamSwap {
    fn default() -> Self {
        Self::new(MAX_ITER)
    }
}

/// The most improving swap found in one pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swap<T> {
    pub slot: usize,
    pub candidate: usize,
    /// Change in the summed distance to the closest medoid.
    pub delta: T,
}

impl<T: Float> Maximizer<T> for PamSwap {
    fn maximize(&self, clustering: &mut Clustering<'_, T>, executor: &Executor) -> Result<usize> {
        superluminal_perf::begin_event("SWAP");

        let mut swaps = 0;
        let mut converged = false;

        for pass in 0..self.max_passes {
            let tolerance = improvement_tolerance(clustering, executor);
            match best_swap(clustering, executor) {
                Some(swap) if swap.delta < -tolerance => {
                    tracing::trace!(
                        pass,
                        slot = swap.slot,
                        candidate = swap.candidate,
                        delta = ?swap.delta,
                        "swap applied"
                    );
                    clustering.swap_medoid(swap.slot, swap.candidate);
                    swaps += 1;
                }
                _ => {
                    converged = true;
                    break;
                }
            }
        }

        superluminal_perf::end_event();

        if !converged {
            tracing::warn!(passes = self.max_passes, "swap stopped at the pass limit");
        }
        tracing::debug!(swaps, converged, "swap finished");

        Ok(swaps)
    }
}

/// Smallest decrease in summed distance that counts as an improvement. Equally
/// good medoid sets can report deltas of a few ulps toward each other.
fn improvement_tolerance<T: Float>(clustering: &Clustering<'_, T>, executor: &Executor) -> T {
    let n = T::from(clustering.distances().num_points()).unwrap_or_else(T::one);
    T::epsilon() * n * clustering.total_distance(executor)
}

/// Scores every (slot, candidate) pair and returns the most negative total,
/// scanning slots then candidates in order so the first of equal totals wins.
pub fn best_swap<T: Float>(clustering: &Clustering<'_, T>, executor: &Executor) -> Option<Swap<T>> {
    let deltas = swap_deltas(clustering, executor);
    let unselected = clustering.selection().unselected();

    let mut best: Option<Swap<T>> = None;
    for (slot, row) in deltas.iter().enumerate() {
        for (&candidate, &delta) in unselected.iter().zip(row) {
            if best.map_or(true, |b| delta < b.delta) {
                best = Some(Swap {
                    slot,
                    candidate,
                    delta,
                });
            }
        }
    }

    best
}

/// One row per medoid slot, one column per unselected candidate.
///
/// A point `p` contributes `min(d(c, p) - d_close, 0)` when its closest medoid is not
/// the one being replaced, and `min(d(c, p), d_second) - d_close` when it is. The sum
/// runs over every unselected point (the candidate itself included) and over the
/// outgoing medoid, which makes each total the exact change in summed distance.
fn swap_deltas<T: Float>(clustering: &Clustering<'_, T>, executor: &Executor) -> Vec<Vec<T>> {
    let distances = clustering.distances();
    let selection = clustering.selection();
    let selected = selection.selected();
    let unselected = selection.unselected();

    let nearest = executor.map(distances.num_points(), |p| {
        two_lowest(distances.distances_to_medoids(p))
    });

    executor.map(selected.len(), |slot| {
        let outgoing = selected[slot];

        unselected
            .iter()
            .map(|&candidate| {
                let contribution = |point: usize| {
                    let (closest, second) = nearest[point];
                    let to_outgoing = distances.distance_to_medoid(point, slot);
                    let to_candidate = distances.distance_to_point(candidate, point);

                    if to_outgoing > closest {
                        (to_candidate - closest).min(T::zero())
                    } else {
                        to_candidate.min(second) - closest
                    }
                };

                unselected
                    .iter()
                    .fold(contribution(outgoing), |total, &point| {
                        total + contribution(point)
                    })
            })
            .collect()
    })
}
