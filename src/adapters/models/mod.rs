//! The fixed algorithm slate.
//!
//! Four classifiers with different inductive biases, trained on the same
//! [`TrainingSet`]. [`SlateModel`] is the persisted, type-erased form.

mod boosting;
mod forest;
mod logistic;
mod svm;
mod tree;

use serde::{Deserialize, Serialize};

pub use boosting::{BoostingParams, GradientBoosting};
pub use forest::{ForestParams, RandomForest};
pub use logistic::{LogisticParams, LogisticRegression};
pub use svm::{SupportVectorMachine, SvmParams};

use crate::config::SlateConfig;
use crate::domain::TrainingSet;
use crate::ports::{Classifier, ModelError};

/// Numerically stable softmax.
pub(crate) fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Members of the slate, in vote order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    RandomForest,
    GradientBoosting,
    LogisticRegression,
    Svm,
}

impl Algorithm {
    /// The slate in vote order.
    pub const SLATE: [Self; 4] = [
        Self::RandomForest,
        Self::GradientBoosting,
        Self::LogisticRegression,
        Self::Svm,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RandomForest => RandomForest::NAME,
            Self::GradientBoosting => GradientBoosting::NAME,
            Self::LogisticRegression => LogisticRegression::NAME,
            Self::Svm => SupportVectorMachine::NAME,
        }
    }

    /// Train this algorithm with its slate hyperparameters.
    ///
    /// # Errors
    /// Propagates the algorithm's training error.
    pub fn fit(&self, set: &TrainingSet, config: &SlateConfig, seed: u64) -> Result<SlateModel, ModelError> {
        Ok(match self {
            Self::RandomForest => SlateModel::RandomForest(RandomForest::fit(set, &config.forest, seed)?),
            Self::GradientBoosting => {
                SlateModel::GradientBoosting(GradientBoosting::fit(set, &config.boosting, seed)?)
            }
            Self::LogisticRegression => {
                SlateModel::LogisticRegression(LogisticRegression::fit(set, &config.logistic, seed)?)
            }
            Self::Svm => SlateModel::Svm(SupportVectorMachine::fit(set, &config.svm, seed)?),
        })
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A trained slate member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "algorithm", content = "model")]
pub enum SlateModel {
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
    LogisticRegression(LogisticRegression),
    Svm(SupportVectorMachine),
}

impl SlateModel {
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::RandomForest(_) => Algorithm::RandomForest,
            Self::GradientBoosting(_) => Algorithm::GradientBoosting,
            Self::LogisticRegression(_) => Algorithm::LogisticRegression,
            Self::Svm(_) => Algorithm::Svm,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::RandomForest(m) => m,
            Self::GradientBoosting(m) => m,
            Self::LogisticRegression(m) => m,
            Self::Svm(m) => m,
        }
    }
}

impl Classifier for SlateModel {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn n_features(&self) -> usize {
        self.inner().n_features()
    }

    fn n_classes(&self) -> usize {
        self.inner().n_classes()
    }

    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.inner().predict_proba(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> SlateConfig {
        SlateConfig {
            forest: ForestParams {
                n_trees: 10,
                ..ForestParams::default()
            },
            boosting: BoostingParams {
                n_stages: 20,
                ..BoostingParams::default()
            },
            logistic: LogisticParams::default(),
            svm: SvmParams::default(),
        }
    }

    fn set() -> TrainingSet {
        TrainingSet::new(
            vec![
                vec![1.0, 1.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 1.0, 1.0],
            ],
            vec![0, 0, 1, 1],
            2,
        )
    }

    #[test]
    fn test_softmax_is_stable() {
        let p = softmax(&[1000.0, 1000.0]);
        assert_eq!(p, vec![0.5, 0.5]);
        let p = softmax(&[0.0, f64::ln(3.0)]);
        assert!((p[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_slate_order_and_names() {
        let names: Vec<_> = Algorithm::SLATE.iter().map(Algorithm::name).collect();
        assert_eq!(
            names,
            vec!["RandomForest", "GradientBoosting", "LogisticRegression", "SVM"]
        );
    }

    #[test]
    fn test_every_algorithm_trains_and_round_trips() {
        let config = small_config();
        for algorithm in Algorithm::SLATE {
            let model = algorithm.fit(&set(), &config, 42).expect("Should train");
            assert_eq!(model.algorithm(), algorithm);
            assert_eq!(model.name(), algorithm.name());
            assert_eq!(model.n_features(), 3);
            assert_eq!(model.n_classes(), 2);

            let json = serde_json::to_string(&model).expect("Should serialize");
            let restored: SlateModel = serde_json::from_str(&json).expect("Should deserialize");
            let x = [1.0, 1.0, 0.0];
            let before = model.predict_proba(&x).expect("Should predict");
            let after = restored.predict_proba(&x).expect("Should predict");
            for (a, b) in before.iter().zip(&after) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }
}
