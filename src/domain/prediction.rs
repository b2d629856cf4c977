//! Prediction result types.
//!
//! Represents the output of the disease classification engine.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AgeGroup, BmiCategory, DiseaseInfo, Observation, TemperatureCategory};

/// Three-tier risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Self-care is usually enough
    Low,
    /// Monitoring and follow-up recommended
    Medium,
    /// Prompt medical consultation advised
    High,
}

impl RiskLevel {
    /// Map an additive risk score onto a tier.
    #[must_use]
    pub fn from_score(score: u32) -> Self {
        if score >= 5 {
            Self::High
        } else if score >= 3 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// One runner-up entry, taken from a single model's vote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeDisease {
    pub disease: String,
    /// Model confidence as a percentage (0-100)
    pub confidence: f64,
    pub source_model: String,
}

/// Vitals-derived context attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub temperature_category: TemperatureCategory,
    pub age_group: AgeGroup,
    pub risk_factors: Vec<String>,
}

impl HealthSummary {
    #[must_use]
    pub fn from_observation(observation: &Observation) -> Self {
        Self {
            bmi: observation.bmi(),
            bmi_category: observation.bmi_category(),
            temperature_category: observation.temperature_category(),
            age_group: observation.age_group(),
            risk_factors: observation.risk_factors(),
        }
    }
}

/// Complete prediction returned to the orchestration layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_disease: String,

    /// Confidence as a percentage (0-100)
    pub confidence: f64,

    pub risk_level: RiskLevel,

    /// Up to three runner-ups, sorted by confidence (descending)
    pub alternative_diseases: Vec<AlternativeDisease>,

    pub key_indicators: Vec<String>,

    pub recommendations: Vec<String>,

    /// Model name → voted disease
    pub model_predictions: BTreeMap<String, String>,

    /// Reference information for the predicted disease, if known
    pub disease_info: Option<DiseaseInfo>,

    pub health: HealthSummary,

    /// Whether the keyword fallback produced this result
    pub fallback: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionResult {
    /// Number of models that contributed a vote.
    #[must_use]
    pub fn vote_count(&self) -> usize {
        if self.fallback {
            0
        } else {
            self.model_predictions.len()
        }
    }
}
