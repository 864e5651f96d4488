use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::Float;

pub mod matrix;

pub trait Measurable<T: Float> {
    /// Measure the dissimilarity between two elements in the collection
    ///
    /// Note that the measure does not have to be symmetric. i.e `measure(i, j) != measure(j, i)` is possible
    fn measure(&self, i: usize, j: usize) -> T;

    /// Return the number of elements in the collection
    fn num_elements(&self) -> usize;
}

/// Pairwise distance between two equal-length coordinate slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dissimilarity {
    /// Manhattan distance.
    L1,
    /// Euclidean distance.
    L2,
}

impl Dissimilarity {
    #[inline]
    pub fn measure<T: Float>(self, a: &[T], b: &[T]) -> T {
        debug_assert_eq!(a.len(), b.len());

        match self {
            Dissimilarity::L1 => a
                .iter()
                .zip(b)
                .fold(T::zero(), |acc, (&x, &y)| acc + (x - y).abs()),
            Dissimilarity::L2 => a
                .iter()
                .zip(b)
                .fold(T::zero(), |acc, (&x, &y)| {
                    let d = x - y;
                    acc + d * d
                })
                .sqrt(),
        }
    }
}

impl Default for Dissimilarity {
    fn default() -> Self {
        Dissimilarity::L2
    }
}

impl fmt::Display for Dissimilarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dissimilarity::L1 => f.write_str("l1"),
            Dissimilarity::L2 => f.write_str("l2"),
        }
    }
}

impl FromStr for Dissimilarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "l1" | "manhattan" => Ok(Dissimilarity::L1),
            "l2" | "euclidean" => Ok(Dissimilarity::L2),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown dissimilarity '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn l2_norm() {
        let a = [-1.0, 2.0, 3.0, 4.0];
        let b = [46.0, -2.0, 1.0, 47.0];
        assert!((Dissimilarity::L2.measure(&a, &b) - 63.8592_f64).abs() < 0.01);
    }

    #[test]
    fn l1_norm() {
        let a = [-1.0_f32, 2.0, 3.0, 4.0];
        let b = [46.0_f32, -2.0, 1.0, 47.0];
        assert_eq!(Dissimilarity::L1.measure(&a, &b), 96.0);
    }

    #[test]
    fn identical_points_are_zero_apart() {
        let a = [0.25, -3.5];
        assert_eq!(Dissimilarity::L1.measure(&a, &a), 0.0);
        assert_eq!(Dissimilarity::L2.measure(&a, &a), 0.0);
    }

    #[test]
    fn parses_names() {
        assert_eq!("L1".parse::<Dissimilarity>().unwrap(), Dissimilarity::L1);
        assert_eq!("euclidean".parse::<Dissimilarity>().unwrap(), Dissimilarity::L2);
        assert!("cosine".parse::<Dissimilarity>().is_err());
    }
}
