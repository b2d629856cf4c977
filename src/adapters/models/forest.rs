//! Random forest: bagged gini trees with a random feature subset per split.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::tree::{ClassificationTreeBuilder, DecisionTree, TreeLimits};
use crate::domain::TrainingSet;
use crate::ports::{check_dimensions, Classifier, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub bootstrap: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            bootstrap: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForest {
    pub const NAME: &'static str = "RandomForest";

    /// Train the forest.
    ///
    /// # Errors
    /// Returns `EmptyTrainingSet` or `NoClasses` on degenerate input.
    pub fn fit(set: &TrainingSet, params: &ForestParams, seed: u64) -> Result<Self, ModelError> {
        if set.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if set.n_classes == 0 {
            return Err(ModelError::NoClasses);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let limits = TreeLimits {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            max_features: Some(((set.n_features as f64).sqrt() as usize).max(1)),
        };
        let n = set.len();

        let trees = (0..params.n_trees.max(1))
            .map(|_| {
                let sample: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                ClassificationTreeBuilder::new(&set.x, &set.y, set.n_classes, limits)
                    .fit(sample, &mut rng)
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            trees = trees.len(),
            max_depth = trees.iter().map(DecisionTree::depth).max().unwrap_or(0),
            "Random forest trained"
        );

        Ok(Self {
            trees,
            n_features: set.n_features,
            n_classes: set.n_classes,
        })
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_dimensions(self.n_features, x)?;
        if self.trees.is_empty() {
            return Err(ModelError::Failed("Forest has no trees".to_string()));
        }

        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.leaf_value(x)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        Ok(proba)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> TrainingSet {
        TrainingSet::new(
            vec![
                vec![1.0, 1.0, 0.0, 0.0],
                vec![1.0, 1.0, 1.0, 0.0],
                vec![1.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0, 1.0],
                vec![0.0, 0.0, 1.0, 0.0],
                vec![0.0, 1.0, 1.0, 1.0],
            ],
            vec![0, 0, 0, 1, 1, 1],
            2,
        )
    }

    #[test]
    fn test_forest_learns_toy_problem() {
        let params = ForestParams {
            n_trees: 25,
            ..ForestParams::default()
        };
        let forest = RandomForest::fit(&toy(), &params, 42).expect("Should train");

        let (class, p) = forest.predict_one(&[1.0, 1.0, 0.0, 0.0]).expect("Should predict");
        assert_eq!(class, 0);
        assert!(p > 0.5);

        let proba = forest.predict_proba(&[0.0, 0.0, 1.0, 1.0]).expect("Should predict");
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(proba[1] > proba[0]);
    }

    #[test]
    fn test_forest_is_deterministic_for_seed() {
        let params = ForestParams {
            n_trees: 10,
            ..ForestParams::default()
        };
        let a = RandomForest::fit(&toy(), &params, 7).expect("Should train");
        let b = RandomForest::fit(&toy(), &params, 7).expect("Should train");
        let x = [1.0, 0.0, 1.0, 0.0];
        assert_eq!(
            a.predict_proba(&x).expect("Should predict"),
            b.predict_proba(&x).expect("Should predict")
        );
    }

    #[test]
    fn test_forest_rejects_bad_input() {
        let empty = TrainingSet::new(vec![], vec![], 2);
        assert_eq!(
            RandomForest::fit(&empty, &ForestParams::default(), 1).err(),
            Some(ModelError::EmptyTrainingSet)
        );

        let forest = RandomForest::fit(&toy(), &ForestParams { n_trees: 3, ..ForestParams::default() }, 1)
            .expect("Should train");
        assert!(matches!(
            forest.predict_proba(&[1.0]),
            Err(ModelError::DimensionMismatch { expected: 4, actual: 1 })
        ));
    }
}
