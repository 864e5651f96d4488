use super::SelectionSet;
use crate::data::Matrix;
use crate::error::Result;
use crate::measure::{matrix::DistanceMatrix, Dissimilarity};
use crate::parallelism::Executor;
use crate::Float;

/// One restart in progress: the medoid selection kept in lockstep with the
/// medoid columns of a borrowed [`DistanceMatrix`].
pub struct Clustering<'a, T: Float> {
    data: &'a Matrix<T>,
    distances: &'a mut DistanceMatrix<T>,
    selection: SelectionSet,
}

impl<'a, T: Float> Clustering<'a, T> {
    /// Starts from an empty medoid set; any medoids left in `distances` are cleared.
    pub fn new(data: &'a Matrix<T>, distances: &'a mut DistanceMatrix<T>) -> Self {
        debug_assert_eq!(data.rows(), distances.num_points());

        distances.reset_medoids();
        let selection = SelectionSet::new(data.rows(), distances.max_medoids());
        Self {
            data,
            distances,
            selection,
        }
    }

    /// Promotes `point` to the next free medoid slot.
    pub fn add_medoid(&mut self, point: usize) -> Result<()> {
        self.selection.select(point)?;
        let slot = self.selection.selected_len() - 1;
        self.distances.assign_medoid_slot(slot, point);
        Ok(())
    }

    /// Replaces the medoid in `slot` with `point`.
    pub fn swap_medoid(&mut self, slot: usize, point: usize) {
        self.selection.replace(slot, point);
        self.distances.assign_medoid_slot(slot, point);
    }

    pub fn data(&self) -> &Matrix<T> {
        self.data
    }

    pub fn distances(&self) -> &DistanceMatrix<T> {
        &*self.distances
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn num_clusters(&self) -> usize {
        self.selection.max_selected()
    }

    /// Sum over all points of the distance to the closest medoid.
    pub fn total_distance(&self, executor: &Executor) -> T {
        let distances = &*self.distances;
        executor.sum(distances.num_points(), |i| {
            distances.closest_medoid_distance(i)
        })
    }

    /// Derives the assignment vector and squared cost from the current medoid columns.
    pub fn finish(self, executor: &Executor) -> ClusterResult<T> {
        let distances = &*self.distances;
        let n = distances.num_points();

        let mut assignments = vec![0; n];
        executor.fill(&mut assignments, |i| distances.closest_medoid_index(i));

        let cost = executor.sum(n, |i| {
            let d = distances.distance_to_medoid(i, assignments[i]);
            d * d
        });

        let medoid_indices = self.selection.selected().to_vec();
        let medoids = self.data.select_rows(&medoid_indices);

        ClusterResult {
            medoid_indices,
            medoids,
            assignments,
            cost,
        }
    }
}

/// A finished clustering. Results are ranked by `cost` alone, lower is better.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterResult<T: Float> {
    /// Index of each medoid in the dataset the result describes; position = cluster id.
    pub medoid_indices: Vec<usize>,
    /// Medoid coordinates, one row per cluster.
    pub medoids: Matrix<T>,
    /// Cluster id of every point.
    pub assignments: Vec<usize>,
    /// Sum of squared distances from every point to its medoid.
    pub cost: T,
}

impl<T: Float> ClusterResult<T> {
    /// Assigns every row of `data` to the closest of the fixed `medoids` coordinates.
    pub fn evaluate(
        data: &Matrix<T>,
        medoids: Matrix<T>,
        medoid_indices: Vec<usize>,
        dissimilarity: Dissimilarity,
        executor: &Executor,
    ) -> Self {
        debug_assert_eq!(medoids.rows(), medoid_indices.len());

        let closest = executor.map(data.rows(), |i| {
            let point = data.row(i);
            let mut best = (0, T::infinity());
            for (slot, medoid) in medoids.iter_rows().enumerate() {
                let d = dissimilarity.measure(point, medoid);
                if d < best.1 {
                    best = (slot, d);
                }
            }
            best
        });

        let assignments = closest.iter().map(|&(slot, _)| slot).collect();
        let cost = closest.iter().fold(T::zero(), |acc, &(_, d)| acc + d * d);

        Self {
            medoid_indices,
            medoids,
            assignments,
            cost,
        }
    }

    pub fn num_clusters(&self) -> usize {
        self.medoid_indices.len()
    }

    pub fn is_better_than(&self, other: &Self) -> bool {
        self.cost < other.cost
    }
}

/// Replaces `best` when `candidate` is strictly cheaper (or nothing is held yet).
/// Returns whether the candidate was kept.
pub fn keep_best<T: Float>(best: &mut Option<ClusterResult<T>>, candidate: ClusterResult<T>) -> bool {
    let wins = best
        .as_ref()
        .map_or(true, |current| candidate.is_better_than(current));
    if wins {
        *best = Some(candidate);
    }
    wins
}
