use std::fmt::Debug;

pub trait Float: num_traits::Float + Debug + Send + Sync + 'static {}

impl Float for f64 {}
impl Float for f32 {}

pub mod algorithms;
pub mod config;
pub mod data;
pub mod error;
pub mod measure;
pub mod parallelism;
pub mod runner;
pub mod types;
pub mod utils;

pub use crate::algorithms::{Clara, KMedoids};
pub use crate::config::{Config, Method, SampleSize};
pub use crate::data::Matrix;
pub use crate::error::{Error, Result};
pub use crate::measure::Dissimilarity;
pub use crate::parallelism::{ExecutionMode, Executor};
pub use crate::runner::{run, RunSummary};
pub use crate::types::ClusterResult;
pub use crate::utils::UniformSelector;
