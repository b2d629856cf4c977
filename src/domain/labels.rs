//! Label encoding: disease name ↔ class index.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Bijection between disease names and class indices.
///
/// Classes are the distinct training labels sorted lexicographically, so the
/// class index of a disease is its rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelEncoding {
    classes: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl LabelEncoding {
    /// Fit the encoding on a label column.
    #[must_use]
    pub fn fit<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = labels
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        Self::from(distinct.into_iter().collect::<Vec<_>>())
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    #[must_use]
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Encode every label of a column.
    ///
    /// # Errors
    /// Returns the first label unknown to this encoding.
    pub fn encode_all<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, String> {
        labels
            .iter()
            .map(|l| {
                self.encode(l.as_ref())
                    .ok_or_else(|| format!("Unknown label: {}", l.as_ref()))
            })
            .collect()
    }

    #[must_use]
    pub fn decode(&self, class: usize) -> Option<&str> {
        self.classes.get(class).map(String::as_str)
    }

    /// Class names in index order (already sorted).
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl From<Vec<String>> for LabelEncoding {
    fn from(classes: Vec<String>) -> Self {
        let index = classes
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { classes, index }
    }
}

impl From<LabelEncoding> for Vec<String> {
    fn from(encoding: LabelEncoding) -> Self {
        encoding.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_sorts_and_dedups() {
        let enc = LabelEncoding::fit(["Flu", "Common Cold", "Flu", "Asthma"]);
        assert_eq!(enc.classes(), ["Asthma", "Common Cold", "Flu"]);
        assert_eq!(enc.encode("Flu"), Some(2));
        assert_eq!(enc.decode(1), Some("Common Cold"));
        assert_eq!(enc.decode(3), None);
    }

    #[test]
    fn test_encode_all() {
        let enc = LabelEncoding::fit(["b", "a"]);
        assert_eq!(enc.encode_all(&["a", "b", "a"]), Ok(vec![0, 1, 0]));
        assert!(enc.encode_all(&["c"]).is_err());
    }

    #[test]
    fn test_roundtrip_through_json() {
        let enc = LabelEncoding::fit(["Flu", "Cold"]);
        let json = serde_json::to_string(&enc).expect("Should serialize");
        let back: LabelEncoding = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(back.encode("Flu"), Some(1));
    }
}
