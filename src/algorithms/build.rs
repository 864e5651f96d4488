use super::*;
use crate::utils::{argmax, argmin};

/// Greedy BUILD: start from the most central point, then repeatedly add the
/// candidate with the largest total dissimilarity gain.
pub struct PamBuild;

impl<T: Float> Initializer<T> for PamBuild {
    fn initialize(
        &self,
        clustering: &mut Clustering<'_, T>,
        _selector: &mut UniformSelector,
        executor: &Executor,
    ) -> Result<()> {
        superluminal_perf::begin_event("BUILD");
        let result = build(clustering, executor);
        superluminal_perf::end_event();
        result
    }
}

fn build<T: Float>(clustering: &mut Clustering<'_, T>, executor: &Executor) -> Result<()> {
    let first = {
        let distances = clustering.distances();
        let sums = executor.map(distances.num_points(), |i| distances.total_distance(i));
        argmin(&sums).map(|(idx, _)| idx)
    };
    let first = first.ok_or_else(|| {
        Error::InvalidConfiguration("cannot choose medoids from an empty dataset".into())
    })?;
    clustering.add_medoid(first)?;
    tracing::trace!(medoid = first, "build selected central medoid");

    while !clustering.selection().is_full() {
        let gains = gains(clustering, executor);
        let (best, gain) = argmax(&gains).ok_or_else(|| {
            Error::InvalidConfiguration("more clusters requested than points available".into())
        })?;

        let candidate = clustering.selection().unselected()[best];
        clustering.add_medoid(candidate)?;
        tracing::trace!(medoid = candidate, gain = ?gain, "build selected medoid");
    }

    Ok(())
}

/// Total gain of promoting each unselected candidate, in unselected order.
fn gains<T: Float>(clustering: &Clustering<'_, T>, executor: &Executor) -> Vec<T> {
    let distances = clustering.distances();
    let unselected = clustering.selection().unselected();

    let closest: Vec<T> = unselected
        .iter()
        .map(|&p| distances.closest_medoid_distance(p))
        .collect();

    executor.map(unselected.len(), |i| {
        let candidate = unselected[i];
        let mut total = T::zero();

        for (&point, &current) in unselected.iter().zip(&closest) {
            if point == candidate {
                continue;
            }

            let gain = current - distances.distance_to_point(candidate, point);
            if gain > T::zero() {
                total = total + gain;
            }
        }

        total
    })
}
