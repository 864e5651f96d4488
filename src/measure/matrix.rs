use super::{Dissimilarity, Measurable};
use crate::data::Matrix;
use crate::parallelism::Executor;
use crate::Float;

/// Cached pairwise distances plus the distances from every point to each current medoid.
///
/// Column `j` of the medoid table always equals the point-to-point column of the point
/// occupying medoid slot `j`. Indices are contract-checked in debug builds only.
#[derive(Debug, Clone)]
pub struct DistanceMatrix<T: Float> {
    data: Vec<T>,
    n_elements: usize,
    to_medoids: Matrix<T>,
    num_medoids: usize,
}

impl<T: Float> DistanceMatrix<T> {
    /// Fills the `n x n` table row by row; rows are independent so the executor may split them.
    pub fn build(
        points: &Matrix<T>,
        num_clusters: usize,
        dissimilarity: Dissimilarity,
        executor: &Executor,
    ) -> Self {
        let n_elements = points.rows();
        let mut data = vec![T::zero(); n_elements * n_elements];

        executor.fill_rows(&mut data, n_elements, |i, row| {
            let a = points.row(i);
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = dissimilarity.measure(a, points.row(j));
            }
        });

        Self::from_flat(data, n_elements, num_clusters)
    }

    /// Wraps a precomputed row-major `n x n` table.
    pub fn from_flat(data: Vec<T>, n_elements: usize, num_clusters: usize) -> Self {
        debug_assert_eq!(data.len(), n_elements * n_elements);
        Self {
            data,
            n_elements,
            to_medoids: Matrix::filled(n_elements, num_clusters, T::max_value()),
            num_medoids: 0,
        }
    }

    #[inline]
    pub fn distance_to_point(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.n_elements && j < self.n_elements);
        unsafe { *self.data.get_unchecked(i * self.n_elements + j) }
    }

    #[inline]
    pub fn distance_to_medoid(&self, point: usize, slot: usize) -> T {
        debug_assert!(slot < self.to_medoids.cols());
        self.to_medoids.at(point, slot)
    }

    /// Row of the point table.
    pub fn distances_to_points(&self, point: usize) -> &[T] {
        debug_assert!(point < self.n_elements);
        &self.data[point * self.n_elements..(point + 1) * self.n_elements]
    }

    /// Distances from `point` to the medoids selected so far.
    pub fn distances_to_medoids(&self, point: usize) -> &[T] {
        &self.to_medoids.row(point)[..self.num_medoids]
    }

    pub fn closest_medoid_distance(&self, point: usize) -> T {
        self.distances_to_medoids(point)
            .iter()
            .fold(T::infinity(), |best, &d| best.min(d))
    }

    /// Slot of the closest medoid; the lowest slot wins ties.
    pub fn closest_medoid_index(&self, point: usize) -> usize {
        let mut best = 0;
        let mut best_distance = T::infinity();
        for (slot, &d) in self.distances_to_medoids(point).iter().enumerate() {
            if d < best_distance {
                best_distance = d;
                best = slot;
            }
        }
        best
    }

    /// Sum of the distances from `point` to every point.
    pub fn total_distance(&self, point: usize) -> T {
        self.distances_to_points(point)
            .iter()
            .fold(T::zero(), |acc, &d| acc + d)
    }

    /// Copies the point column of `point` into medoid slot `slot`.
    pub fn assign_medoid_slot(&mut self, slot: usize, point: usize) {
        debug_assert!(slot < self.to_medoids.cols());
        debug_assert!(point < self.n_elements);

        let n = self.n_elements;
        let column = self.data.iter().skip(point).step_by(n).copied();
        self.to_medoids.set_column(slot, column);
        self.num_medoids = self.num_medoids.max(slot + 1);
    }

    /// Forgets every medoid while keeping the point table.
    pub fn reset_medoids(&mut self) {
        self.to_medoids.fill(T::max_value());
        self.num_medoids = 0;
    }

    pub fn num_points(&self) -> usize {
        self.n_elements
    }

    pub fn num_medoids(&self) -> usize {
        self.num_medoids
    }

    pub fn max_medoids(&self) -> usize {
        self.to_medoids.cols()
    }
}

impl<T: Float> Measurable<T> for DistanceMatrix<T> {
    #[inline]
    fn measure(&self, i: usize, j: usize) -> T {
        self.distance_to_point(i, j)
    }

    fn num_elements(&self) -> usize {
        self.n_elements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Matrix<f64> {
        Matrix::from_rows(&[[0.0], [1.0], [3.0], [7.0]]).unwrap()
    }

    #[test]
    fn builds_symmetric_table() {
        let d = DistanceMatrix::build(&line(), 2, Dissimilarity::L1, &Executor::sequential());

        assert_eq!(d.num_elements(), 4);
        assert_eq!(d.measure(0, 3), 7.0);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(d.measure(i, j), d.measure(j, i));
            }
        }
        assert_eq!(d.total_distance(1), 1.0 + 2.0 + 6.0);
    }

    #[test]
    fn parallel_build_matches_sequential() {
        let points = line();
        let exec = Executor::new(crate::ExecutionMode::SharedMemoryParallel, Some(3)).unwrap();
        let a = DistanceMatrix::build(&points, 2, Dissimilarity::L2, &exec);
        let b = DistanceMatrix::build(&points, 2, Dissimilarity::L2, &Executor::sequential());
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn medoid_columns_track_point_columns() {
        let mut d = DistanceMatrix::build(&line(), 2, Dissimilarity::L1, &Executor::sequential());
        d.assign_medoid_slot(0, 2);
        d.assign_medoid_slot(1, 0);

        assert_eq!(d.num_medoids(), 2);
        for p in 0..4 {
            assert_eq!(d.distance_to_medoid(p, 0), d.distance_to_point(p, 2));
            assert_eq!(d.distance_to_medoid(p, 1), d.distance_to_point(p, 0));
        }

        assert_eq!(d.closest_medoid_index(1), 1);
        assert_eq!(d.closest_medoid_distance(1), 1.0);
        assert_eq!(d.closest_medoid_index(3), 0);
        assert_eq!(d.closest_medoid_distance(3), 4.0);
    }

    #[test]
    fn only_selected_slots_count() {
        let mut d = DistanceMatrix::build(&line(), 3, Dissimilarity::L1, &Executor::sequential());
        d.assign_medoid_slot(0, 3);

        assert_eq!(d.distances_to_medoids(0), &[7.0]);
        assert_eq!(d.closest_medoid_distance(0), 7.0);

        d.reset_medoids();
        assert_eq!(d.num_medoids(), 0);
        assert_eq!(d.closest_medoid_distance(0), f64::INFINITY);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn out_of_range_point_fails_fast_in_debug() {
        let d = DistanceMatrix::build(&line(), 2, Dissimilarity::L1, &Executor::sequential());
        d.distance_to_point(0, 4);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn out_of_range_slot_fails_fast_in_debug() {
        let mut d = DistanceMatrix::build(&line(), 2, Dissimilarity::L1, &Executor::sequential());
        d.assign_medoid_slot(2, 0);
    }
}
