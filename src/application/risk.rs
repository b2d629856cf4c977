//! Additive risk scoring.

use crate::domain::{Observation, RiskLevel};

const HIGH_RISK_KEYWORDS: [&str; 5] = ["heart disease", "diabetes", "cancer", "stroke", "pneumonia"];
const MEDIUM_RISK_KEYWORDS: [&str; 4] = ["flu", "bronchitis", "asthma", "hypertension"];

/// Points contributed by the disease name alone.
///
/// Case-insensitive substring match; the high tier is checked first.
#[must_use]
pub fn disease_points(disease: &str) -> u32 {
    let lower = disease.to_lowercase();
    if HIGH_RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        2
    } else if MEDIUM_RISK_KEYWORDS.iter().any(|k| lower.contains(k)) {
        1
    } else {
        0
    }
}

/// Total additive score for an observation and predicted disease.
#[must_use]
pub fn risk_score(observation: &Observation, disease: &str) -> u32 {
    let mut score = 0;

    let age = observation.age();
    if age > 65 {
        score += 2;
    } else if age < 18 {
        score += 1;
    }

    let bmi = observation.bmi();
    if bmi > 30.0 || bmi < 18.5 {
        score += 1;
    }

    let temperature = observation.temperature_c();
    if temperature > 38.5 {
        score += 2;
    } else if temperature > 37.5 {
        score += 1;
    }

    if observation.symptoms().len() > 5 {
        score += 1;
    }

    score + disease_points(disease)
}

#[must_use]
pub fn assess(observation: &Observation, disease: &str) -> RiskLevel {
    RiskLevel::from_score(risk_score(observation, disease))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Gender;

    fn obs(age: u32, temperature: f64) -> Observation {
        // 175 cm / 70 kg -> BMI 22.86, no bonus
        Observation::new(age, Gender::Other, 175.0, 70.0, temperature).expect("Should build")
    }

    #[test]
    fn test_temperature_boundaries_are_strict() {
        assert_eq!(risk_score(&obs(30, 38.5), "X"), 1);
        assert_eq!(risk_score(&obs(30, 38.51), "X"), 2);
        assert_eq!(risk_score(&obs(30, 37.5), "X"), 0);
        assert_eq!(risk_score(&obs(30, 37.6), "X"), 1);
    }

    #[test]
    fn test_age_boundaries_are_strict() {
        assert_eq!(risk_score(&obs(65, 36.6), "X"), 0);
        assert_eq!(risk_score(&obs(66, 36.6), "X"), 2);
        assert_eq!(risk_score(&obs(18, 36.6), "X"), 0);
        assert_eq!(risk_score(&obs(17, 36.6), "X"), 1);
    }

    #[test]
    fn test_bmi_and_symptom_count() {
        let heavy = Observation::new(40, Gender::Male, 170.0, 100.0, 36.6).expect("Should build");
        assert_eq!(risk_score(&heavy, "X"), 1);

        let busy = obs(40, 36.6).with_symptoms(["a", "b", "c", "d", "e", "f"]);
        assert_eq!(risk_score(&busy, "X"), 1);
        let five = obs(40, 36.6).with_symptoms(["a", "b", "c", "d", "e"]);
        assert_eq!(risk_score(&five, "X"), 0);
    }

    #[test]
    fn test_disease_keywords() {
        assert_eq!(disease_points("Coronary Heart Disease"), 2);
        assert_eq!(disease_points("Pneumonia"), 2);
        assert_eq!(disease_points("Influenza / FLU"), 1);
        assert_eq!(disease_points("Asthma"), 1);
        assert_eq!(disease_points("Common Cold"), 0);
        // Substring matching is intentionally naive.
        assert_eq!(disease_points("Strokeless something"), 2);
    }

    #[test]
    fn test_assess_tiers() {
        assert_eq!(assess(&obs(28, 38.2), "Common Cold"), RiskLevel::Low);
        assert_eq!(assess(&obs(70, 38.2), "Flu"), RiskLevel::Medium);
        assert_eq!(assess(&obs(70, 39.0), "Pneumonia"), RiskLevel::High);
    }
}
