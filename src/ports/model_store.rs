//! Model store port: Trait for persisting a trained ensemble.
//!
//! This trait abstracts the artifact format from the application logic so a
//! trained slate survives process restarts.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::domain::{DiseaseCatalog, LabelEncoding, SymptomVocabulary, TrainingReport};

/// Current bundle format version.
pub const BUNDLE_VERSION: u32 = 1;

/// Everything needed to predict without retraining.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle<M> {
    pub version: u32,
    pub vocabulary: SymptomVocabulary,
    pub labels: LabelEncoding,
    pub models: Vec<M>,
    pub report: TrainingReport,
    #[serde(default)]
    pub catalog: DiseaseCatalog,
}

impl<M: Classifier> ModelBundle<M> {
    /// Check that the bundle can serve predictions for its own vocabulary.
    ///
    /// # Errors
    /// Returns a description of the first incompatibility.
    pub fn check_compatible(&self) -> Result<(), String> {
        if self.version != BUNDLE_VERSION {
            return Err(format!(
                "Unsupported bundle version {} (expected {BUNDLE_VERSION})",
                self.version
            ));
        }
        if self.vocabulary.is_empty() {
            return Err("Bundle vocabulary is empty".to_string());
        }
        if self.labels.is_empty() {
            return Err("Bundle label encoding is empty".to_string());
        }
        if self.models.is_empty() {
            return Err("Bundle contains no models".to_string());
        }
        for model in &self.models {
            if model.n_features() != self.vocabulary.len() {
                return Err(format!(
                    "Model {} expects {} features, vocabulary has {}",
                    model.name(),
                    model.n_features(),
                    self.vocabulary.len()
                ));
            }
            if model.n_classes() != self.labels.len() {
                return Err(format!(
                    "Model {} emits {} classes, label encoding has {}",
                    model.name(),
                    model.n_classes(),
                    self.labels.len()
                ));
            }
        }
        Ok(())
    }
}

/// Trait for local model artifact storage.
pub trait ModelStore: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persist a bundle, replacing any previous one.
    ///
    /// # Errors
    /// Returns error if the bundle cannot be written.
    fn save<M: Serialize>(&self, bundle: &ModelBundle<M>) -> Result<(), Self::Error>;

    /// Load the persisted bundle.
    ///
    /// # Returns
    /// `None` if nothing has been stored yet.
    ///
    /// # Errors
    /// Returns error if the artifact is corrupt, tampered with, or incompatible.
    fn load<M: DeserializeOwned + Classifier>(&self) -> Result<Option<ModelBundle<M>>, Self::Error>;

    /// Check if a bundle exists.
    fn exists(&self) -> bool;

    /// Delete the stored bundle.
    ///
    /// # Errors
    /// Returns error if removal fails.
    fn clear(&self) -> Result<(), Self::Error>;
}
