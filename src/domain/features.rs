//! Feature encoding: Observation symptoms → binary vector.

use serde::{Deserialize, Serialize};

use super::SymptomVocabulary;
use crate::MedisenseError;

/// Fixed-length 0/1 vector aligned to a [`SymptomVocabulary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of features set to 1.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|&&v| v > 0.0).count()
    }
}

/// Split free-text additional symptoms on commas, trim and lower-case each
/// token, dropping empty ones.
#[must_use]
pub fn parse_additional_symptoms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Encode selected symptoms plus free-text additions against `vocabulary`.
///
/// Selected symptoms match exactly; free-text tokens match case-insensitively
/// and set every column that differs from them only by case.
/// Names outside the vocabulary are ignored.
///
/// # Errors
/// Returns `VocabularyUnavailable` if the vocabulary is empty.
pub fn encode<I, S>(
    vocabulary: &SymptomVocabulary,
    symptoms: I,
    additional_symptoms_raw: &str,
) -> Result<FeatureVector, MedisenseError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if vocabulary.is_empty() {
        return Err(MedisenseError::VocabularyUnavailable);
    }

    let mut features = vec![0.0; vocabulary.len()];

    for symptom in symptoms {
        if let Some(i) = vocabulary.index_of(symptom.as_ref()) {
            features[i] = 1.0;
        }
    }

    for token in parse_additional_symptoms(additional_symptoms_raw) {
        for &i in vocabulary.indices_of_lowercase(&token) {
            features[i] = 1.0;
        }
    }

    Ok(FeatureVector(features))
}
