//! # Medisense
//!
//! Symptom-driven disease classification engine.
//!
//! This crate provides:
//! - Binary feature encoding of symptom observations against a fixed vocabulary
//! - A fixed slate of independently trained classifiers voting as an ensemble
//! - Additive risk scoring, templated advice and a keyword fallback predictor
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (Observation, vocabulary, PredictionResult)
//! - `ports`: Trait definitions for external seams (classifiers, model store, training data)
//! - `adapters`: Concrete implementations (algorithm slate, CSV source, JSON store)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven configuration
//!
//! Prediction never fails: when no trained model can vote, the keyword
//! fallback predictor answers instead.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::DiseasePredictor;
pub use config::AppConfig;
pub use domain::{Gender, Observation, PredictionResult, RiskLevel};

/// Result type for Medisense operations
pub type Result<T> = std::result::Result<T, MedisenseError>;

/// Main error type for Medisense
#[derive(Debug, thiserror::Error)]
pub enum MedisenseError {
    #[error("Symptom vocabulary unavailable: no training data and no persisted model")]
    VocabularyUnavailable,

    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Model {model} failed during inference: {reason}")]
    Inference { model: String, reason: String },

    #[error("No model available to vote")]
    NoModelAvailable,

    #[error("Training failed: {0}")]
    Training(String),

    #[error("Invalid observation: {0}")]
    Validation(String),

    #[error("Classifier error: {0}")]
    Model(#[from] ports::ModelError),

    #[error("Training data error: {0}")]
    Source(#[from] ports::SourceError),

    #[error("Model store error: {0}")]
    Store(#[from] adapters::StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
