//! Multinomial logistic regression trained by full-batch gradient descent.
//!
//! Objective: mean cross-entropy + `||W||^2 / (2 * C * n)`. The intercept is
//! not penalized. The step size is `1 / L` where `L` bounds the gradient's
//! Lipschitz constant, so descent is monotone without a line search.

use serde::{Deserialize, Serialize};

use super::softmax;
use crate::domain::TrainingSet;
use crate::ports::{check_dimensions, Classifier, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularization strength.
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the gradient norm falls below this.
    pub tol: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// One weight row per class.
    weights: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    n_iter: usize,
}

impl LogisticRegression {
    pub const NAME: &'static str = "LogisticRegression";

    /// Train the model.
    ///
    /// # Errors
    /// Returns `EmptyTrainingSet` or `NoClasses` on degenerate input, or
    /// `Failed` for a non-positive `c`.
    pub fn fit(set: &TrainingSet, params: &LogisticParams, _seed: u64) -> Result<Self, ModelError> {
        if set.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if set.n_classes == 0 {
            return Err(ModelError::NoClasses);
        }
        if !(params.c > 0.0 && params.c.is_finite()) {
            return Err(ModelError::Failed(format!("C must be positive, got {}", params.c)));
        }

        let (n, d, k) = (set.len(), set.n_features, set.n_classes);
        let nf = n as f64;
        let lambda = 1.0 / (params.c * nf);

        let max_sq_norm = set
            .x
            .iter()
            .map(|row| 1.0 + row.iter().map(|v| v * v).sum::<f64>())
            .fold(0.0, f64::max);
        let step = 1.0 / (0.5 * max_sq_norm + lambda);

        let mut model = Self {
            weights: vec![vec![0.0; d]; k],
            intercepts: vec![0.0; k],
            n_iter: 0,
        };

        let mut grad_w = vec![vec![0.0; d]; k];
        let mut grad_b = vec![0.0; k];

        for iter in 0..params.max_iter {
            grad_w
                .iter_mut()
                .zip(&model.weights)
                .for_each(|(g, w)| g.iter_mut().zip(w).for_each(|(g, w)| *g = lambda * w));
            grad_b.iter_mut().for_each(|g| *g = 0.0);

            for (row, &label) in set.x.iter().zip(&set.y) {
                let proba = softmax(&model.scores(row));
                for class in 0..k {
                    let err = (proba[class] - f64::from(u8::from(label == class))) / nf;
                    grad_b[class] += err;
                    for (g, &v) in grad_w[class].iter_mut().zip(row) {
                        *g += err * v;
                    }
                }
            }

            let norm = grad_w
                .iter()
                .flatten()
                .chain(&grad_b)
                .map(|g| g * g)
                .sum::<f64>()
                .sqrt();
            model.n_iter = iter + 1;
            if norm < params.tol {
                break;
            }

            for (w, g) in model.weights.iter_mut().zip(&grad_w) {
                for (w, g) in w.iter_mut().zip(g) {
                    *w -= step * g;
                }
            }
            for (b, g) in model.intercepts.iter_mut().zip(&grad_b) {
                *b -= step * g;
            }
        }

        if model.n_iter == params.max_iter {
            tracing::debug!(max_iter = params.max_iter, "Logistic regression hit iteration cap");
        } else {
            tracing::debug!(iterations = model.n_iter, "Logistic regression converged");
        }

        Ok(model)
    }

    fn scores(&self, x: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| b + w.iter().zip(x).map(|(w, v)| w * v).sum::<f64>())
            .collect()
    }

    /// Iterations run during training.
    #[must_use]
    pub fn n_iter(&self) -> usize {
        self.n_iter
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn n_features(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    fn n_classes(&self) -> usize {
        self.weights.len()
    }

    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_dimensions(self.n_features(), x)?;
        let proba = softmax(&self.scores(x));
        if proba.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::NonFinite);
        }
        Ok(proba)
    }
}
