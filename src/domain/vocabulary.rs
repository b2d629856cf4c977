//! Symptom vocabulary: the index-to-name mapping of the feature space.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Ordered, duplicate-free list of symptom names.
///
/// Built once from the training table header and shared read-only by the
/// feature encoder and every classifier. Names are kept verbatim
/// (case-sensitive, file order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SymptomVocabulary {
    names: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    #[serde(skip)]
    lowercase_index: HashMap<String, Vec<usize>>,
}

impl SymptomVocabulary {
    /// Build a vocabulary from symptom names in column order.
    ///
    /// # Errors
    /// Returns an error naming the first duplicated symptom.
    pub fn new<I, S>(names: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(names.len());
        let mut lowercase_index = HashMap::with_capacity(names.len());

        for (i, name) in names.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(format!("Duplicate symptom column: {name}"));
            }
            // Columns that differ only by case share one lower-case key.
            lowercase_index
                .entry(name.to_lowercase())
                .or_insert_with(Vec::new)
                .push(i);
        }

        Ok(Self {
            names,
            index,
            lowercase_index,
        })
    }

    /// Number of symptoms (feature vector length).
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Exact-match lookup.
    #[must_use]
    pub fn index_of(&self, symptom: &str) -> Option<usize> {
        self.index.get(symptom).copied()
    }

    /// Every column whose lower-cased name equals an already lower-cased
    /// token, in column order. Empty when nothing matches.
    #[must_use]
    pub fn indices_of_lowercase(&self, symptom_lower: &str) -> &[usize] {
        self.lowercase_index
            .get(symptom_lower)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Symptom names sorted alphabetically (for display).
    #[must_use]
    pub fn sorted(&self) -> Vec<&str> {
        let mut sorted: Vec<&str> = self.iter().collect();
        sorted.sort_unstable();
        sorted
    }
}

impl TryFrom<Vec<String>> for SymptomVocabulary {
    type Error = String;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<SymptomVocabulary> for Vec<String> {
    fn from(vocabulary: SymptomVocabulary) -> Self {
        vocabulary.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_column_order() {
        let vocab = SymptomVocabulary::new(["fever", "cough", "Headache"]).expect("Should build");
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.index_of("cough"), Some(1));
        assert_eq!(vocab.index_of("headache"), None);
        assert_eq!(vocab.indices_of_lowercase("headache"), &[2]);
        assert!(vocab.indices_of_lowercase("nausea").is_empty());
        assert_eq!(vocab.sorted(), vec!["Headache", "cough", "fever"]);
    }

    #[test]
    fn test_case_variants_share_lowercase_key() {
        let vocab = SymptomVocabulary::new(["Fever", "cough", "fever"]).expect("Should build");
        assert_eq!(vocab.index_of("Fever"), Some(0));
        assert_eq!(vocab.index_of("fever"), Some(2));
        assert_eq!(vocab.indices_of_lowercase("fever"), &[0, 2]);
    }

    #[test]
    fn test_rejects_duplicates() {
        let err = SymptomVocabulary::new(["fever", "fever"]).expect_err("Must reject");
        assert!(err.contains("fever"));
    }

    #[test]
    fn test_serde_rebuilds_index() {
        let vocab = SymptomVocabulary::new(["fever", "cough"]).expect("Should build");
        let json = serde_json::to_string(&vocab).expect("Should serialize");
        assert_eq!(json, r#"["fever","cough"]"#);

        let back: SymptomVocabulary = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(back.index_of("cough"), Some(1));
        assert_eq!(back, vocab);
    }
}
