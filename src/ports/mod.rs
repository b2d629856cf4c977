//! Ports layer: Trait definitions for external seams.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and its collaborators (classification
//! algorithms, persisted model artifacts, training data ingestion).

mod classifier;
mod model_store;
mod training_source;

pub(crate) use classifier::check_dimensions;
pub use classifier::{Classifier, ModelError};
pub use model_store::{ModelBundle, ModelStore, BUNDLE_VERSION};
pub use training_source::{SourceError, TrainingSource};
