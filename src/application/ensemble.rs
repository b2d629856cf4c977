//! Ensemble: run every member on one feature vector and collect votes.

use crate::domain::{FeatureVector, LabelEncoding};
use crate::ports::Classifier;
use crate::MedisenseError;

/// One member's vote.
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub model: String,
    pub disease: String,
    /// Max class probability, as a fraction
    pub confidence: f64,
}

/// Ordered list of trained members sharing one label encoding.
pub struct Ensemble {
    members: Vec<Box<dyn Classifier>>,
    labels: LabelEncoding,
}

impl Ensemble {
    #[must_use]
    pub fn new(members: Vec<Box<dyn Classifier>>, labels: LabelEncoding) -> Self {
        Self { members, labels }
    }

    /// Box concrete models, keeping their order.
    #[must_use]
    pub fn from_models<C: Classifier + 'static>(models: Vec<C>, labels: LabelEncoding) -> Self {
        let members = models
            .into_iter()
            .map(|m| Box::new(m) as Box<dyn Classifier>)
            .collect();
        Self::new(members, labels)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name())
    }

    #[must_use]
    pub fn labels(&self) -> &LabelEncoding {
        &self.labels
    }

    /// Votes from every member that answered, in member order.
    ///
    /// A member that errors, or emits a class the label encoding cannot
    /// decode, is dropped with a warning.
    ///
    /// # Errors
    /// Returns `NoModelAvailable` if no member produced a vote.
    pub fn predict_all(&self, features: &FeatureVector) -> Result<Vec<Vote>, MedisenseError> {
        let mut votes = Vec::with_capacity(self.members.len());

        for member in &self.members {
            let outcome = member
                .predict_one(features.as_slice())
                .map_err(|e| e.to_string())
                .and_then(|(class, confidence)| {
                    self.labels
                        .decode(class)
                        .map(|disease| (disease.to_string(), confidence))
                        .ok_or_else(|| format!("class index {class} has no label"))
                });

            match outcome {
                Ok((disease, confidence)) => votes.push(Vote {
                    model: member.name().to_string(),
                    disease,
                    confidence,
                }),
                Err(reason) => {
                    let err = MedisenseError::Inference {
                        model: member.name().to_string(),
                        reason,
                    };
                    tracing::warn!(error = %err, "Dropping model vote");
                }
            }
        }

        if votes.is_empty() {
            return Err(MedisenseError::NoModelAvailable);
        }
        tracing::debug!(votes = votes.len(), members = self.members.len(), "Ensemble voted");
        Ok(votes)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{voting, FailingModel};
    use super::*;
    use crate::domain::{encode, SymptomVocabulary};

    fn labels() -> LabelEncoding {
        LabelEncoding::fit(["Cold", "Flu"])
    }

    fn features() -> FeatureVector {
        let vocab = SymptomVocabulary::new(["fever", "cough"]).expect("Should build");
        encode(&vocab, ["fever"], "").expect("Should encode")
    }

    #[test]
    fn test_predict_all_in_member_order() {
        let ensemble = Ensemble::new(
            vec![
                Box::new(voting("A", 2, 1, 0.7, 2)),
                Box::new(voting("B", 2, 0, 0.6, 2)),
            ],
            labels(),
        );
        let votes = ensemble.predict_all(&features()).expect("Should vote");
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].model, "A");
        assert_eq!(votes[0].disease, "Flu");
        assert!((votes[0].confidence - 0.7).abs() < 1e-12);
        assert_eq!(votes[1].disease, "Cold");
    }

    #[test]
    fn test_failing_member_is_dropped() {
        let ensemble = Ensemble::new(
            vec![Box::new(FailingModel), Box::new(voting("B", 2, 1, 0.9, 2))],
            labels(),
        );
        let votes = ensemble.predict_all(&features()).expect("Should vote");
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].model, "B");
    }

    #[test]
    fn test_wrong_width_and_unknown_class_are_dropped() {
        let ensemble = Ensemble::new(
            vec![
                Box::new(voting("Wide", 2, 0, 0.9, 7)),
                Box::new(voting("Extra", 3, 2, 0.9, 2)),
            ],
            labels(),
        );
        assert!(matches!(
            ensemble.predict_all(&features()),
            Err(MedisenseError::NoModelAvailable)
        ));
    }

    #[test]
    fn test_empty_and_all_failing_ensembles() {
        let empty = Ensemble::new(vec![], labels());
        assert!(empty.is_empty());
        assert!(matches!(
            empty.predict_all(&features()),
            Err(MedisenseError::NoModelAvailable)
        ));

        let single = Ensemble::new(vec![Box::new(FailingModel)], labels());
        assert_eq!(single.member_names().collect::<Vec<_>>(), vec!["Failing"]);
        assert!(matches!(
            single.predict_all(&features()),
            Err(MedisenseError::NoModelAvailable)
        ));
    }
}
