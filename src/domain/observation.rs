//! Observation: one user's demographics, vitals and symptoms.
//!
//! BMI and its category are derived at construction and cannot be set
//! independently.

use serde::{Deserialize, Serialize};

use crate::MedisenseError;

/// Self-reported gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Ok(Self::Male),
            "female" | "f" => Ok(Self::Female),
            "other" | "o" => Ok(Self::Other),
            other => Err(format!("Unknown gender: {other}")),
        }
    }
}

/// WHO BMI bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Underweight => write!(f, "Underweight"),
            Self::Normal => write!(f, "Normal"),
            Self::Overweight => write!(f, "Overweight"),
            Self::Obese => write!(f, "Obese"),
        }
    }
}

/// Body temperature band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureCategory {
    Low,
    Normal,
    MildFever,
    HighFever,
}

impl TemperatureCategory {
    #[must_use]
    pub fn from_celsius(temperature_c: f64) -> Self {
        if temperature_c < 36.0 {
            Self::Low
        } else if temperature_c <= 37.5 {
            Self::Normal
        } else if temperature_c <= 38.5 {
            Self::MildFever
        } else {
            Self::HighFever
        }
    }
}

/// Coarse age bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeGroup {
    ChildTeen,
    YoungAdult,
    Adult,
    MiddleAged,
    Senior,
}

impl AgeGroup {
    #[must_use]
    pub fn from_age(age: u32) -> Self {
        match age {
            0..=17 => Self::ChildTeen,
            18..=29 => Self::YoungAdult,
            30..=49 => Self::Adult,
            50..=64 => Self::MiddleAged,
            _ => Self::Senior,
        }
    }
}

/// Wire form of an observation, as submitted by the orchestration layer.
#[derive(Debug, Clone, Deserialize)]
struct ObservationInput {
    age: u32,
    height_cm: f64,
    weight_kg: f64,
    gender: Gender,
    temperature_c: f64,
    #[serde(default)]
    symptoms: Vec<String>,
    #[serde(default, alias = "additional_symptoms")]
    additional_symptoms_raw: String,
}

/// A single prediction request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ObservationInput")]
pub struct Observation {
    age: u32,
    height_cm: f64,
    weight_kg: f64,
    gender: Gender,
    bmi: f64,
    bmi_category: BmiCategory,
    temperature_c: f64,
    /// Selected symptoms, first-entry order, no duplicates.
    symptoms: Vec<String>,
    additional_symptoms_raw: String,
}

impl Observation {
    /// Create an observation with no symptoms.
    ///
    /// # Errors
    /// Returns `Validation` if height or weight is not a positive finite
    /// number, or the temperature is not finite.
    pub fn new(
        age: u32,
        gender: Gender,
        height_cm: f64,
        weight_kg: f64,
        temperature_c: f64,
    ) -> Result<Self, MedisenseError> {
        if !(height_cm.is_finite() && height_cm > 0.0) {
            return Err(MedisenseError::Validation(format!(
                "Height {height_cm} cm must be positive"
            )));
        }
        if !(weight_kg.is_finite() && weight_kg > 0.0) {
            return Err(MedisenseError::Validation(format!(
                "Weight {weight_kg} kg must be positive"
            )));
        }
        if !temperature_c.is_finite() {
            return Err(MedisenseError::Validation(
                "Temperature must be a finite number".to_string(),
            ));
        }

        let height_m = height_cm / 100.0;
        let bmi = weight_kg / (height_m * height_m);

        Ok(Self {
            age,
            height_cm,
            weight_kg,
            gender,
            bmi,
            bmi_category: BmiCategory::from_bmi(bmi),
            temperature_c,
            symptoms: Vec::new(),
            additional_symptoms_raw: String::new(),
        })
    }

    /// Attach selected symptoms. Names are kept verbatim; blank names and
    /// exact repeats are dropped.
    #[must_use]
    pub fn with_symptoms<I, S>(mut self, symptoms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for symptom in symptoms {
            let symptom = symptom.into();
            if !symptom.trim().is_empty() && !self.symptoms.contains(&symptom) {
                self.symptoms.push(symptom);
            }
        }
        self
    }

    /// Attach free-text, comma-separated additional symptoms.
    #[must_use]
    pub fn with_additional_symptoms(mut self, raw: impl Into<String>) -> Self {
        self.additional_symptoms_raw = raw.into();
        self
    }

    #[must_use]
    pub fn age(&self) -> u32 {
        self.age
    }

    #[must_use]
    pub fn gender(&self) -> Gender {
        self.gender
    }

    #[must_use]
    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    #[must_use]
    pub fn weight_kg(&self) -> f64 {
        self.weight_kg
    }

    /// Body-mass index (kg/m²).
    #[must_use]
    pub fn bmi(&self) -> f64 {
        self.bmi
    }

    #[must_use]
    pub fn bmi_category(&self) -> BmiCategory {
        self.bmi_category
    }

    #[must_use]
    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    #[must_use]
    pub fn symptoms(&self) -> &[String] {
        &self.symptoms
    }

    #[must_use]
    pub fn has_symptom(&self, symptom: &str) -> bool {
        self.symptoms.iter().any(|s| s == symptom)
    }

    #[must_use]
    pub fn additional_symptoms_raw(&self) -> &str {
        &self.additional_symptoms_raw
    }

    #[must_use]
    pub fn temperature_category(&self) -> TemperatureCategory {
        TemperatureCategory::from_celsius(self.temperature_c)
    }

    #[must_use]
    pub fn age_group(&self) -> AgeGroup {
        AgeGroup::from_age(self.age)
    }

    /// Human-readable risk factors present in this observation.
    #[must_use]
    pub fn risk_factors(&self) -> Vec<String> {
        let mut factors = Vec::new();

        if self.bmi < 18.5 {
            factors.push("Underweight - may indicate nutritional deficiencies".to_string());
        } else if self.bmi > 30.0 {
            factors.push("Obesity - increased risk of cardiovascular diseases".to_string());
        }
        if self.age > 65 {
            factors.push("Advanced age - increased risk of chronic diseases".to_string());
        }
        if self.temperature_c > 38.5 {
            factors.push("High fever - may indicate serious infection".to_string());
        }
        if self.symptoms.len() > 5 {
            factors.push("Multiple symptoms - may indicate complex condition".to_string());
        }

        factors
    }

    /// Validate that the observation is plausible and has symptoms.
    ///
    /// The prediction core does not call this; it is the caller's gate
    /// before submitting a request.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.age > 120 {
            errors.push(format!("Age {} out of range [0, 120]", self.age));
        }
        if !(30.0..=250.0).contains(&self.height_cm) {
            errors.push(format!(
                "Height {} cm out of range [30, 250]",
                self.height_cm
            ));
        }
        if !(2.0..=400.0).contains(&self.weight_kg) {
            errors.push(format!(
                "Weight {} kg out of range [2, 400]",
                self.weight_kg
            ));
        }
        if !(30.0..=45.0).contains(&self.temperature_c) {
            errors.push(format!(
                "Temperature {} °C out of range [30, 45]",
                self.temperature_c
            ));
        }
        if self.symptoms.is_empty() && self.additional_symptoms_raw.trim().is_empty() {
            errors.push("At least one symptom is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl TryFrom<ObservationInput> for Observation {
    type Error = MedisenseError;

    fn try_from(input: ObservationInput) -> Result<Self, Self::Error> {
        Ok(Self::new(
            input.age,
            input.gender,
            input.height_cm,
            input.weight_kg,
            input.temperature_c,
        )?
        .with_symptoms(input.symptoms)
        .with_additional_symptoms(input.additional_symptoms_raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bmi_derivation() {
        let obs = Observation::new(30, Gender::Male, 170.0, 70.0, 36.8).expect("Should build");
        assert!((obs.bmi() - 24.22).abs() < 0.01);
        assert_eq!(obs.bmi_category(), BmiCategory::Normal);
    }

    #[test]
    fn test_bmi_category_thresholds() {
        assert_eq!(BmiCategory::from_bmi(18.49), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_rejects_zero_height() {
        assert!(Observation::new(30, Gender::Female, 0.0, 60.0, 37.0).is_err());
        assert!(Observation::new(30, Gender::Female, 160.0, f64::NAN, 37.0).is_err());
    }

    #[test]
    fn test_symptoms_deduplicated_in_order() {
        let obs = Observation::new(30, Gender::Other, 160.0, 60.0, 37.0)
            .expect("Should build")
            .with_symptoms(["cough", "fever", "cough", " ", "fatigue"]);
        assert_eq!(obs.symptoms(), ["cough", "fever", "fatigue"]);
        assert!(obs.has_symptom("fever"));
    }

    #[test]
    fn test_symptoms_kept_verbatim() {
        let obs = Observation::new(30, Gender::Other, 160.0, 60.0, 37.0)
            .expect("Should build")
            .with_symptoms([" cough", "cough", "\t"]);
        assert_eq!(obs.symptoms(), [" cough", "cough"]);
        assert!(!obs.has_symptom("fever"));
    }

    #[test]
    fn test_health_metrics() {
        let obs = Observation::new(70, Gender::Male, 160.0, 90.0, 38.9).expect("Should build");
        assert_eq!(obs.age_group(), AgeGroup::Senior);
        assert_eq!(obs.temperature_category(), TemperatureCategory::HighFever);
        assert_eq!(TemperatureCategory::from_celsius(37.5), TemperatureCategory::Normal);
        assert_eq!(TemperatureCategory::from_celsius(38.5), TemperatureCategory::MildFever);

        let factors = obs.risk_factors();
        assert_eq!(factors.len(), 3);
        assert!(factors[0].starts_with("Obesity"));
    }

    #[test]
    fn test_validation() {
        let valid = Observation::new(28, Gender::Female, 165.0, 58.0, 37.2)
            .expect("Should build")
            .with_symptoms(["cough"]);
        assert!(valid.validate().is_ok());

        let free_text_only = Observation::new(28, Gender::Female, 165.0, 58.0, 37.2)
            .expect("Should build")
            .with_additional_symptoms("chills");
        assert!(free_text_only.validate().is_ok());

        let invalid = Observation::new(150, Gender::Female, 165.0, 58.0, 50.0).expect("Should build");
        let errors = invalid.validate().expect_err("Must fail");
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_deserialize_derives_bmi() {
        let json = r#"{
            "age": 28, "height_cm": 175.0, "weight_kg": 70.0, "gender": "Male",
            "temperature_c": 38.2, "symptoms": ["fever", "cough"],
            "additional_symptoms": "Chills"
        }"#;
        let obs: Observation = serde_json::from_str(json).expect("Should parse");
        assert!((obs.bmi() - 22.857).abs() < 0.01);
        assert_eq!(obs.additional_symptoms_raw(), "Chills");
        assert_eq!(obs.symptoms().len(), 2);
    }

    #[test]
    fn test_gender_parsing() {
        assert_eq!("female".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!(" M ".parse::<Gender>(), Ok(Gender::Male));
        assert!("x".parse::<Gender>().is_err());
    }
}
