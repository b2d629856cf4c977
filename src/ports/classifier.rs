//! Classifier port: Trait shared by every member of the model slate.
//!
//! Each algorithm is trained by its own `fit` constructor; once trained it is
//! read-only and used through this trait.

/// Errors raised by a classifier during training or inference.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Expected {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Model produced a non-finite probability")]
    NonFinite,

    #[error("Cannot train on an empty training set")]
    EmptyTrainingSet,

    #[error("Model has no classes")]
    NoClasses,

    #[error("{0}")]
    Failed(String),
}

/// Trait for a trained classifier.
///
/// Implementations must be immutable after training so that one instance
/// can serve concurrent predictions without locking.
pub trait Classifier: Send + Sync {
    /// Stable model name used as the vote key.
    fn name(&self) -> &str;

    /// Expected feature vector length.
    fn n_features(&self) -> usize;

    /// Number of classes in the probability output.
    fn n_classes(&self) -> usize;

    /// Per-class probability distribution for one feature vector.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` if `x` has the wrong length, or
    /// `NonFinite` if the model produced NaN/inf.
    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ModelError>;

    /// Predicted class and its probability.
    ///
    /// Ties go to the lowest class index.
    ///
    /// # Errors
    /// Propagates `predict_proba` errors; `NoClasses` on an empty output.
    fn predict_one(&self, x: &[f64]) -> Result<(usize, f64), ModelError> {
        let proba = self.predict_proba(x)?;
        let mut best: Option<(usize, f64)> = None;
        for (class, &p) in proba.iter().enumerate() {
            if !p.is_finite() {
                return Err(ModelError::NonFinite);
            }
            match best {
                Some((_, bp)) if p <= bp => {}
                _ => best = Some((class, p)),
            }
        }
        best.ok_or(ModelError::NoClasses)
    }
}

/// Shared input check for implementations.
///
/// # Errors
/// Returns `DimensionMismatch` when the lengths differ.
pub(crate) fn check_dimensions(expected: usize, x: &[f64]) -> Result<(), ModelError> {
    if x.len() == expected {
        Ok(())
    } else {
        Err(ModelError::DimensionMismatch {
            expected,
            actual: x.len(),
        })
    }
}
