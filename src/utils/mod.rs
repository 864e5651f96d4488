mod selector;

pub use self::selector::UniformSelector;

/// Returns a tuple containing the index and value of the minimum element.
/// The first of several equal minima wins; `None` for an empty slice.
pub fn argmin<T: PartialOrd + Copy>(xs: &[T]) -> Option<(usize, T)> {
    let mut best: Option<(usize, T)> = None;
    for (i, &x) in xs.iter().enumerate() {
        match best {
            Some((_, b)) if !(x < b) => {}
            _ => best = Some((i, x)),
        }
    }
    best
}

/// Returns a tuple containing the index and value of the maximum element.
/// The first of several equal maxima wins; `None` for an empty slice.
pub fn argmax<T: PartialOrd + Copy>(xs: &[T]) -> Option<(usize, T)> {
    let mut best: Option<(usize, T)> = None;
    for (i, &x) in xs.iter().enumerate() {
        match best {
            Some((_, b)) if !(x > b) => {}
            _ => best = Some((i, x)),
        }
    }
    best
}

/// Smallest and second smallest values, counting repeats separately.
pub fn two_lowest<T: crate::Float>(xs: &[T]) -> (T, T) {
    let mut best = T::infinity();
    let mut second = T::infinity();

    for &x in xs {
        if x < best {
            second = best;
            best = x;
        } else if x < second {
            second = x;
        }
    }

    (best, second)
}
