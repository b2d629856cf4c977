//! Domain layer: Core business types and logic.
//!
//! This module contains pure Rust types with no I/O.
//! All types are serializable and immutable once constructed.

mod dataset;
mod disease;
mod features;
mod labels;
mod observation;
mod prediction;
mod report;
mod vocabulary;

pub use dataset::{TrainingSet, TrainingTable};
pub use disease::{DiseaseCatalog, DiseaseInfo};
pub use features::{encode, parse_additional_symptoms, FeatureVector};
pub use labels::LabelEncoding;
pub use observation::{AgeGroup, BmiCategory, Gender, Observation, TemperatureCategory};
pub use prediction::{AlternativeDisease, HealthSummary, PredictionResult, RiskLevel};
pub use report::{ModelScore, SplitKind, TrainingReport};
pub use vocabulary::SymptomVocabulary;
