//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! training, ensemble voting and the prediction pipeline.

pub mod advice;
pub mod aggregate;
pub mod ensemble;
pub mod fallback;
mod predictor;
pub mod risk;
pub mod training;

pub use aggregate::{aggregate, Aggregate};
pub use ensemble::{Ensemble, Vote};
pub use predictor::{configured_source, DiseasePredictor, ModelContext};
pub use training::{split_indices, train_slate, Split};
