//! Disease reference information derived from the training table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::TrainingTable;

/// Descriptive entry for one disease.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseInfo {
    pub name: String,
    /// Symptoms marked present in the disease's first training row.
    pub symptoms: Vec<String>,
    pub severity: String,
    pub description: String,
    pub precautions: Vec<String>,
    pub treatment_approach: String,
}

impl DiseaseInfo {
    /// Build an entry, choosing the narrative by keyword in the name.
    #[must_use]
    pub fn new(name: &str, symptoms: Vec<String>) -> Self {
        let lower = name.to_lowercase();
        let (severity, description, precautions, treatment): (&str, String, &[&str], &str) = if lower.contains("cold") {
            (
                "Low",
                "Common cold is a viral infection of the upper respiratory tract.".to_string(),
                &["Rest", "Stay hydrated", "Avoid close contact with others"],
                "Symptomatic treatment and rest",
            )
        } else if lower.contains("flu") {
            (
                "Medium",
                "Influenza is a viral infection that affects the respiratory system.".to_string(),
                &["Rest", "Stay hydrated", "Antiviral medication if prescribed"],
                "Antiviral treatment and supportive care",
            )
        } else if lower.contains("fever") {
            (
                "Medium",
                "Fever is an elevated body temperature, often a sign of infection.".to_string(),
                &["Monitor temperature", "Stay hydrated", "Rest"],
                "Antipyretics and identify underlying cause",
            )
        } else {
            (
                "Medium",
                format!("Information about {name}"),
                &[],
                "Consult a healthcare professional",
            )
        };

        Self {
            name: name.to_string(),
            symptoms,
            severity: severity.to_string(),
            description,
            precautions: precautions.iter().map(|p| (*p).to_string()).collect(),
            treatment_approach: treatment.to_string(),
        }
    }
}

/// Disease name → [`DiseaseInfo`], built once per trained ensemble.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiseaseCatalog {
    entries: BTreeMap<String, DiseaseInfo>,
}

impl DiseaseCatalog {
    /// Build one entry per distinct disease in the table.
    #[must_use]
    pub fn from_table(table: &TrainingTable) -> Self {
        let mut entries = BTreeMap::new();

        for (row, label) in table.rows.iter().zip(&table.labels) {
            if entries.contains_key(label) {
                continue;
            }
            let symptoms = row
                .iter()
                .enumerate()
                .filter(|&(_, &v)| v == 1.0)
                .filter_map(|(i, _)| table.vocabulary.name(i).map(str::to_string))
                .collect();
            entries.insert(label.clone(), DiseaseInfo::new(label, symptoms));
        }

        Self { entries }
    }

    #[must_use]
    pub fn get(&self, disease: &str) -> Option<&DiseaseInfo> {
        self.entries.get(disease)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SymptomVocabulary;

    #[test]
    fn test_catalog_uses_first_row_per_disease() {
        let table = TrainingTable::new(
            SymptomVocabulary::new(["fever", "cough", "fatigue"]).expect("Should build"),
            vec![
                vec![1.0, 1.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![1.0, 0.0, 1.0],
            ],
            vec!["Flu".into(), "Flu".into(), "Migraine".into()],
        )
        .expect("Should build");

        let catalog = DiseaseCatalog::from_table(&table);
        assert_eq!(catalog.len(), 2);

        let flu = catalog.get("Flu").expect("Should have flu");
        assert_eq!(flu.symptoms, vec!["fever", "cough"]);
        assert_eq!(flu.severity, "Medium");
        assert_eq!(flu.precautions.len(), 3);

        let migraine = catalog.get("Migraine").expect("Should have migraine");
        assert_eq!(migraine.description, "Information about Migraine");
        assert!(migraine.precautions.is_empty());
    }

    #[test]
    fn test_cold_is_low_severity() {
        let info = DiseaseInfo::new("Common Cold", vec![]);
        assert_eq!(info.severity, "Low");
        assert_eq!(info.treatment_approach, "Symptomatic treatment and rest");
    }
}
