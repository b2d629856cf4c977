//! Multinomial gradient boosting.
//!
//! Each stage fits one shallow regression tree per class to the softmax
//! residuals `y_k - p_k`. Leaf values take a single Newton step:
//!
//! ```text
//! gamma = (K - 1) / K * sum(r) / sum(|r| * (1 - |r|))
//! ```

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::softmax;
use super::tree::{DecisionTree, RegressionTreeBuilder, TreeLimits};
use crate::domain::TrainingSet;
use crate::ports::{check_dimensions, Classifier, ModelError};

/// Lower bound on a class prior before taking its log.
const PRIOR_FLOOR: f64 = 1e-8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_stages: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_stages: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoosting {
    init: Vec<f64>,
    learning_rate: f64,
    /// `stages[m][k]` is the tree for class `k` at stage `m`.
    stages: Vec<Vec<DecisionTree>>,
    n_features: usize,
}

impl GradientBoosting {
    pub const NAME: &'static str = "GradientBoosting";

    /// Train the booster.
    ///
    /// # Errors
    /// Returns `EmptyTrainingSet` or `NoClasses` on degenerate input, or
    /// `Failed` for a non-positive learning rate.
    pub fn fit(set: &TrainingSet, params: &BoostingParams, seed: u64) -> Result<Self, ModelError> {
        if set.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        let k = set.n_classes;
        if k == 0 {
            return Err(ModelError::NoClasses);
        }
        if !(params.learning_rate > 0.0 && params.learning_rate.is_finite()) {
            return Err(ModelError::Failed(format!(
                "Learning rate must be positive, got {}",
                params.learning_rate
            )));
        }

        let n = set.len();
        let init: Vec<f64> = set
            .class_counts()
            .iter()
            .map(|&c| (c as f64 / n as f64).max(PRIOR_FLOOR).ln())
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let limits = TreeLimits {
            max_depth: Some(params.max_depth),
            min_samples_split: params.min_samples_split.max(2),
            max_features: None,
        };
        let scale = (k as f64 - 1.0) / k as f64;

        let mut scores = vec![init.clone(); n];
        let mut stages = Vec::with_capacity(params.n_stages);

        // A single class has nothing to separate.
        let n_stages = if k < 2 { 0 } else { params.n_stages };

        for _ in 0..n_stages {
            let proba: Vec<Vec<f64>> = scores.iter().map(|s| softmax(s)).collect();
            let mut stage = Vec::with_capacity(k);

            for class in 0..k {
                let residuals: Vec<f64> = (0..n)
                    .map(|i| f64::from(u8::from(set.y[i] == class)) - proba[i][class])
                    .collect();

                let leaf = |idx: &[usize]| {
                    let num: f64 = idx.iter().map(|&i| residuals[i]).sum();
                    let den: f64 = idx
                        .iter()
                        .map(|&i| residuals[i].abs() * (1.0 - residuals[i].abs()))
                        .sum();
                    if den.abs() < 1e-12 {
                        0.0
                    } else {
                        scale * num / den
                    }
                };

                let tree = RegressionTreeBuilder::new(&set.x, &residuals, limits).fit(
                    (0..n).collect(),
                    leaf,
                    &mut rng,
                );

                for (i, row) in set.x.iter().enumerate() {
                    scores[i][class] += params.learning_rate * tree.predict_value(row);
                }
                stage.push(tree);
            }
            stages.push(stage);
        }

        tracing::debug!(stages = stages.len(), classes = k, "Gradient boosting trained");

        Ok(Self {
            init,
            learning_rate: params.learning_rate,
            stages,
            n_features: set.n_features,
        })
    }

    fn raw_scores(&self, x: &[f64]) -> Vec<f64> {
        let mut scores = self.init.clone();
        for stage in &self.stages {
            for (score, tree) in scores.iter_mut().zip(stage) {
                *score += self.learning_rate * tree.predict_value(x);
            }
        }
        scores
    }
}

impl Classifier for GradientBoosting {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.init.len()
    }

    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_dimensions(self.n_features, x)?;
        let proba = softmax(&self.raw_scores(x));
        if proba.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::NonFinite);
        }
        Ok(proba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_class() -> TrainingSet {
        TrainingSet::new(
            vec![
                vec![1.0, 0.0, 0.0],
                vec![1.0, 0.0, 1.0],
                vec![0.0, 1.0, 0.0],
                vec![0.0, 1.0, 1.0],
                vec![0.0, 0.0, 1.0],
                vec![0.0, 0.0, 1.0],
            ],
            vec![0, 0, 1, 1, 2, 2],
            3,
        )
    }

    #[test]
    fn test_boosting_fits_training_data() {
        let params = BoostingParams {
            n_stages: 30,
            ..BoostingParams::default()
        };
        let model = GradientBoosting::fit(&three_class(), &params, 42).expect("Should train");

        for (row, &label) in three_class().x.iter().zip(&three_class().y) {
            let (class, _) = model.predict_one(row).expect("Should predict");
            assert_eq!(class, label);
        }
        let proba = model.predict_proba(&[1.0, 0.0, 0.0]).expect("Should predict");
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_stages_predicts_priors() {
        let set = TrainingSet::new(
            vec![vec![0.0], vec![1.0], vec![1.0], vec![1.0]],
            vec![0, 1, 1, 1],
            2,
        );
        let params = BoostingParams {
            n_stages: 0,
            ..BoostingParams::default()
        };
        let model = GradientBoosting::fit(&set, &params, 1).expect("Should train");
        let proba = model.predict_proba(&[0.0]).expect("Should predict");
        assert!((proba[0] - 0.25).abs() < 1e-9);
        assert!((proba[1] - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_absent_class_gets_floor_prior() {
        let set = TrainingSet::new(vec![vec![0.0], vec![1.0]], vec![0, 0], 2);
        let model = GradientBoosting::fit(&set, &BoostingParams::default(), 1).expect("Should train");
        let (class, p) = model.predict_one(&[1.0]).expect("Should predict");
        assert_eq!(class, 0);
        assert!(p > 0.99);
    }

    #[test]
    fn test_rejects_bad_learning_rate() {
        let params = BoostingParams {
            learning_rate: 0.0,
            ..BoostingParams::default()
        };
        assert!(matches!(
            GradientBoosting::fit(&three_class(), &params, 1),
            Err(ModelError::Failed(_))
        ));
    }
}
