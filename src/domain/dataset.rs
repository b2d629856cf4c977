//! Training data as delivered by the ingestion collaborator and as consumed
//! by the classifiers.

use serde::{Deserialize, Serialize};

use super::{LabelEncoding, SymptomVocabulary};

/// Symptom-to-disease table: one binary row per record plus its disease name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingTable {
    pub vocabulary: SymptomVocabulary,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<String>,
}

impl TrainingTable {
    /// Build a table, checking that every row matches the vocabulary width
    /// and that there is one label per row.
    ///
    /// # Errors
    /// Returns a description of the first shape mismatch.
    pub fn new(
        vocabulary: SymptomVocabulary,
        rows: Vec<Vec<f64>>,
        labels: Vec<String>,
    ) -> Result<Self, String> {
        if rows.len() != labels.len() {
            return Err(format!(
                "Row count {} does not match label count {}",
                rows.len(),
                labels.len()
            ));
        }
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| r.len() != vocabulary.len())
        {
            return Err(format!(
                "Row {i} has {} features, expected {}",
                row.len(),
                vocabulary.len()
            ));
        }

        Ok(Self {
            vocabulary,
            rows,
            labels,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Encode the label column into a [`TrainingSet`].
    ///
    /// # Errors
    /// Returns an error if a label is unknown to `labels`.
    pub fn to_training_set(&self, labels: &LabelEncoding) -> Result<TrainingSet, String> {
        let y = labels.encode_all(&self.labels)?;
        Ok(TrainingSet::new(self.rows.clone(), y, labels.len()))
    }
}

/// Dense design matrix with encoded class targets.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub x: Vec<Vec<f64>>,
    pub y: Vec<usize>,
    pub n_classes: usize,
    pub n_features: usize,
}

impl TrainingSet {
    #[must_use]
    pub fn new(x: Vec<Vec<f64>>, y: Vec<usize>, n_classes: usize) -> Self {
        let n_features = x.first().map_or(0, Vec::len);
        Self {
            x,
            y,
            n_classes,
            n_features,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.y.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Rows selected by `indices`, keeping the class count and width.
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            x: indices.iter().map(|&i| self.x[i].clone()).collect(),
            y: indices.iter().map(|&i| self.y[i]).collect(),
            n_classes: self.n_classes,
            n_features: self.n_features,
        }
    }

    /// Samples per class.
    #[must_use]
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &c in &self.y {
            counts[c] += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> SymptomVocabulary {
        SymptomVocabulary::new(["fever", "cough"]).expect("Should build")
    }

    #[test]
    fn test_shape_checks() {
        assert!(TrainingTable::new(vocab(), vec![vec![1.0, 0.0]], vec![]).is_err());
        assert!(TrainingTable::new(vocab(), vec![vec![1.0]], vec!["Flu".into()]).is_err());
        assert!(TrainingTable::new(vocab(), vec![vec![1.0, 0.0]], vec!["Flu".into()]).is_ok());
    }

    #[test]
    fn test_training_set_subset() {
        let table = TrainingTable::new(
            vocab(),
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]],
            vec!["Flu".into(), "Cold".into(), "Flu".into()],
        )
        .expect("Should build");
        let labels = LabelEncoding::fit(&table.labels);
        let set = table.to_training_set(&labels).expect("Should encode");

        assert_eq!(set.y, vec![1, 0, 1]);
        assert_eq!(set.class_counts(), vec![1, 2]);

        let sub = set.subset(&[2, 1]);
        assert_eq!(sub.y, vec![1, 0]);
        assert_eq!(sub.x[0], vec![1.0, 1.0]);
        assert_eq!(sub.n_features, 2);
    }
}
