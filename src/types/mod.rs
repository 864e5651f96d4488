mod clusters;
mod selection;

pub use self::clusters::{keep_best, ClusterResult, Clustering};
pub use self::selection::SelectionSet;
