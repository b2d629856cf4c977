//! Keyword rule predictor used when no trained model can vote.

use std::collections::BTreeMap;

use crate::domain::{HealthSummary, Observation, PredictionResult, RiskLevel};

/// Vote key recorded for fallback predictions.
pub const FALLBACK_MODEL: &str = "Fallback";
pub const FALLBACK_CONFIDENCE: f64 = 60.0;

const FALLBACK_ADVICE: [&str; 3] = [
    "Consult with a healthcare professional for accurate diagnosis",
    "Monitor your symptoms closely",
    "Get adequate rest and maintain good hygiene",
];

/// Disease chosen by the rule chain.
#[must_use]
pub fn fallback_disease(observation: &Observation) -> &'static str {
    let has = |s: &str| observation.has_symptom(s);

    if observation.temperature_c() > 38.5 {
        if has("cough") && has("fatigue") {
            "Flu"
        } else {
            "Fever"
        }
    } else if has("headache") && has("fatigue") {
        "Headache/Migraine"
    } else if has("cough") && has("sore_throat") {
        "Common Cold"
    } else {
        "General Illness"
    }
}

/// Complete result from the rule chain. Never fails.
#[must_use]
pub fn fallback(observation: &Observation) -> PredictionResult {
    let disease = fallback_disease(observation);

    PredictionResult {
        predicted_disease: disease.to_string(),
        confidence: FALLBACK_CONFIDENCE,
        risk_level: RiskLevel::Medium,
        alternative_diseases: Vec::new(),
        key_indicators: vec![format!(
            "Presenting symptoms: {}",
            observation.symptoms().join(", ")
        )],
        recommendations: FALLBACK_ADVICE.iter().map(|s| (*s).to_string()).collect(),
        model_predictions: BTreeMap::from([(FALLBACK_MODEL.to_string(), disease.to_string())]),
        disease_info: None,
        health: HealthSummary::from_observation(observation),
        fallback: true,
        created_at: chrono::Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;

    fn obs<const N: usize>(temperature: f64, symptoms: [&str; N]) -> Observation {
        Observation::new(35, Gender::Male, 180.0, 75.0, temperature)
            .expect("Should build")
            .with_symptoms(symptoms)
    }

    #[test]
    fn test_high_fever_with_cough_and_fatigue_is_flu() {
        let result = fallback(&obs(39.0, ["cough", "fatigue"]));
        assert_eq!(result.predicted_disease, "Flu");
        assert!((result.confidence - 60.0).abs() < f64::EPSILON);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert_eq!(result.model_predictions.get("Fallback").map(String::as_str), Some("Flu"));
        assert_eq!(result.key_indicators, vec!["Presenting symptoms: cough, fatigue"]);
        assert_eq!(result.recommendations.len(), 3);
        assert!(result.alternative_diseases.is_empty());
        assert!(result.fallback);
        assert_eq!(result.vote_count(), 0);
    }

    #[test]
    fn test_rule_chain() {
        assert_eq!(fallback_disease(&obs(39.0, ["cough"])), "Fever");
        assert_eq!(fallback_disease(&obs(38.5, ["cough", "fatigue"])), "General Illness");
        assert_eq!(fallback_disease(&obs(37.0, ["headache", "fatigue"])), "Headache/Migraine");
        assert_eq!(fallback_disease(&obs(37.0, ["cough", "sore_throat"])), "Common Cold");
        assert_eq!(fallback_disease(&obs(37.0, [])), "General Illness");
    }

    #[test]
    fn test_empty_symptoms_still_produce_result() {
        let result = fallback(&obs(36.6, []));
        assert_eq!(result.key_indicators, vec!["Presenting symptoms: "]);
    }
}
