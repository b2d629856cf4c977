//! Templated recommendations and key indicators.

use crate::domain::Observation;

const COLD_ADVICE: [&str; 4] = [
    "Get plenty of rest and sleep",
    "Stay hydrated by drinking water and warm fluids",
    "Use a humidifier to ease congestion",
    "Gargle with warm salt water for sore throat",
];

const FLU_ADVICE: [&str; 4] = [
    "Rest in bed and avoid physical exertion",
    "Stay hydrated and eat light, nutritious meals",
    "Take antiviral medication if prescribed by doctor",
    "Monitor your temperature regularly",
];

const FEVER_ADVICE: [&str; 4] = [
    "Take fever-reducing medication as directed",
    "Stay hydrated with water and electrolyte drinks",
    "Rest and avoid strenuous activities",
    "Use cool compresses to reduce body temperature",
];

const GENERAL_ADVICE: [&str; 4] = [
    "Consult with a healthcare professional",
    "Monitor your symptoms closely",
    "Get adequate rest and maintain good hygiene",
    "Follow any prescribed treatment plan",
];

/// Number of symptoms quoted in the symptom indicator.
const QUOTED_SYMPTOMS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advice {
    pub recommendations: Vec<String>,
    pub key_indicators: Vec<String>,
}

/// Render a Celsius value the way it was entered: `39.0`, `38.25`.
fn format_celsius(t: f64) -> String {
    if t.fract() == 0.0 {
        format!("{t:.1}")
    } else {
        format!("{t}")
    }
}

/// Disease template first, then the age add-on, then the BMI add-on.
#[must_use]
pub fn recommendations(observation: &Observation, disease: &str) -> Vec<String> {
    let lower = disease.to_lowercase();
    let template = if lower.contains("cold") {
        &COLD_ADVICE
    } else if lower.contains("flu") {
        &FLU_ADVICE
    } else if lower.contains("fever") {
        &FEVER_ADVICE
    } else {
        &GENERAL_ADVICE
    };
    let mut out: Vec<String> = template.iter().map(|s| (*s).to_string()).collect();

    let age = observation.age();
    if age > 65 {
        out.push("Consider consulting a geriatric specialist".to_string());
    } else if age < 18 {
        out.push("Ensure proper nutrition for growth and recovery".to_string());
    }

    let bmi = observation.bmi();
    if bmi > 30.0 {
        out.push("Consider weight management as part of treatment".to_string());
    } else if bmi < 18.5 {
        out.push("Focus on proper nutrition and weight gain".to_string());
    }

    out
}

/// Observations that stand out, in a fixed order. May be empty.
#[must_use]
pub fn key_indicators(observation: &Observation) -> Vec<String> {
    let mut out = Vec::new();

    let temperature = observation.temperature_c();
    if temperature > 37.5 {
        out.push(format!("Elevated temperature ({}°C)", format_celsius(temperature)));
    }

    let bmi = observation.bmi();
    if bmi > 30.0 {
        out.push(format!("High BMI ({bmi:.1})"));
    } else if bmi < 18.5 {
        out.push(format!("Low BMI ({bmi:.1})"));
    }

    let symptoms = observation.symptoms();
    if !symptoms.is_empty() {
        let quoted = &symptoms[..symptoms.len().min(QUOTED_SYMPTOMS)];
        out.push(format!("Presenting symptoms: {}", quoted.join(", ")));
    }

    if observation.age() > 65 {
        out.push(format!("Advanced age ({} years)", observation.age()));
    }

    out
}

#[must_use]
pub fn explain(observation: &Observation, disease: &str) -> Advice {
    Advice {
        recommendations: recommendations(observation, disease),
        key_indicators: key_indicators(observation),
    }
}
