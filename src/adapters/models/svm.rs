//! One-vs-rest RBF support vector machine.
//!
//! Each class gets a binary machine trained with simplified SMO. Decision
//! values are mapped to probabilities by a per-class Platt sigmoid fitted on
//! the training decision values, then normalized across classes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::domain::TrainingSet;
use crate::ports::{check_dimensions, Classifier, ModelError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    pub c: f64,
    /// RBF width; `None` selects `1 / (n_features * Var(X))`.
    pub gamma: Option<f64>,
    pub tol: f64,
    /// Consecutive passes without an update before SMO stops.
    pub max_passes: usize,
    /// Hard cap on SMO sweeps.
    pub max_sweeps: usize,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: None,
            tol: 1e-3,
            max_passes: 5,
            max_sweeps: 200,
        }
    }
}

/// Binary machine for one class against the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BinaryMachine {
    /// `(support vector index, alpha * y)` pairs.
    coef: Vec<(usize, f64)>,
    bias: f64,
    platt_a: f64,
    platt_b: f64,
}

impl BinaryMachine {
    fn decision(&self, kernel_row: &[f64]) -> f64 {
        self.bias
            + self
                .coef
                .iter()
                .map(|&(sv, weight)| weight * kernel_row[sv])
                .sum::<f64>()
    }

    fn probability(&self, decision: f64) -> f64 {
        sigmoid(self.platt_a * decision + self.platt_b)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportVectorMachine {
    support_vectors: Vec<Vec<f64>>,
    machines: Vec<BinaryMachine>,
    gamma: f64,
    n_features: usize,
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn rbf(a: &[f64], b: &[f64], gamma: f64) -> f64 {
    let dist: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    (-gamma * dist).exp()
}

/// `1 / (n_features * Var(X))`, or 1.0 when X is constant.
fn scale_gamma(x: &[Vec<f64>], n_features: usize) -> f64 {
    let count = (x.len() * n_features) as f64;
    if count == 0.0 {
        return 1.0;
    }
    let mean = x.iter().flatten().sum::<f64>() / count;
    let var = x.iter().flatten().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    if var > 0.0 {
        1.0 / (n_features as f64 * var)
    } else {
        1.0
    }
}

struct Smo<'a> {
    kernel: &'a [Vec<f64>],
    y: Vec<f64>,
    alpha: Vec<f64>,
    bias: f64,
}

impl Smo<'_> {
    fn output(&self, i: usize) -> f64 {
        self.bias
            + self
                .alpha
                .iter()
                .zip(&self.y)
                .zip(&self.kernel[i])
                .filter(|&((&a, _), _)| a > 0.0)
                .map(|((a, y), k)| a * y * k)
                .sum::<f64>()
    }

    fn run<R: Rng>(&mut self, params: &SvmParams, rng: &mut R) {
        let n = self.y.len();
        let c = params.c;
        let mut passes = 0;
        let mut sweeps = 0;

        while passes < params.max_passes && sweeps < params.max_sweeps {
            sweeps += 1;
            let mut changed = 0;

            for i in 0..n {
                let e_i = self.output(i) - self.y[i];
                let r_i = self.y[i] * e_i;
                if !((r_i < -params.tol && self.alpha[i] < c) || (r_i > params.tol && self.alpha[i] > 0.0)) {
                    continue;
                }

                let mut j = rng.gen_range(0..n - 1);
                if j >= i {
                    j += 1;
                }
                let e_j = self.output(j) - self.y[j];
                let (a_i, a_j) = (self.alpha[i], self.alpha[j]);

                let (lo, hi) = if self.y[i] == self.y[j] {
                    ((a_i + a_j - c).max(0.0), (a_i + a_j).min(c))
                } else {
                    ((a_j - a_i).max(0.0), (c + a_j - a_i).min(c))
                };
                if (hi - lo).abs() < 1e-12 {
                    continue;
                }

                let (k_ii, k_jj, k_ij) = (self.kernel[i][i], self.kernel[j][j], self.kernel[i][j]);
                let eta = 2.0 * k_ij - k_ii - k_jj;
                if eta >= 0.0 {
                    continue;
                }

                let new_j = (a_j - self.y[j] * (e_i - e_j) / eta).clamp(lo, hi);
                if (new_j - a_j).abs() < 1e-5 {
                    continue;
                }
                let new_i = a_i + self.y[i] * self.y[j] * (a_j - new_j);

                let d_i = self.y[i] * (new_i - a_i);
                let d_j = self.y[j] * (new_j - a_j);
                let b1 = self.bias - e_i - d_i * k_ii - d_j * k_ij;
                let b2 = self.bias - e_j - d_i * k_ij - d_j * k_jj;
                self.bias = if new_i > 0.0 && new_i < c {
                    b1
                } else if new_j > 0.0 && new_j < c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                self.alpha[i] = new_i;
                self.alpha[j] = new_j;
                changed += 1;
            }

            passes = if changed == 0 { passes + 1 } else { 0 };
        }
    }
}

/// Fit `sigmoid(a * f + b)` to binary targets with Platt's smoothed labels.
fn fit_platt(decisions: &[f64], positive: &[bool]) -> (f64, f64) {
    let n_pos = positive.iter().filter(|&&p| p).count() as f64;
    let n_neg = positive.len() as f64 - n_pos;
    let hi = (n_pos + 1.0) / (n_pos + 2.0);
    let lo = 1.0 / (n_neg + 2.0);
    let n = decisions.len().max(1) as f64;

    let (mut a, mut b) = (1.0, 0.0);
    for _ in 0..500 {
        let (mut ga, mut gb) = (0.0, 0.0);
        for (&f, &pos) in decisions.iter().zip(positive) {
            let t = if pos { hi } else { lo };
            let err = sigmoid(a * f + b) - t;
            ga += err * f;
            gb += err;
        }
        a -= ga / n;
        b -= gb / n;
    }
    (a, b)
}

impl SupportVectorMachine {
    pub const NAME: &'static str = "SVM";

    /// Train one binary machine per class.
    ///
    /// # Errors
    /// Returns `EmptyTrainingSet` or `NoClasses` on degenerate input, or
    /// `Failed` for a non-positive `c` or `gamma`.
    pub fn fit(set: &TrainingSet, params: &SvmParams, seed: u64) -> Result<Self, ModelError> {
        if set.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if set.n_classes == 0 {
            return Err(ModelError::NoClasses);
        }
        if !(params.c > 0.0 && params.c.is_finite()) {
            return Err(ModelError::Failed(format!("C must be positive, got {}", params.c)));
        }
        let gamma = params
            .gamma
            .unwrap_or_else(|| scale_gamma(&set.x, set.n_features));
        if !(gamma > 0.0 && gamma.is_finite()) {
            return Err(ModelError::Failed(format!("Gamma must be positive, got {gamma}")));
        }

        let n = set.len();
        let kernel: Vec<Vec<f64>> = set
            .x
            .iter()
            .map(|a| set.x.iter().map(|b| rbf(a, b, gamma)).collect())
            .collect();

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut raw = Vec::with_capacity(set.n_classes);

        for class in 0..set.n_classes {
            let y: Vec<f64> = set
                .y
                .iter()
                .map(|&label| if label == class { 1.0 } else { -1.0 })
                .collect();
            let n_pos = y.iter().filter(|&&v| v > 0.0).count();

            let (alpha, bias) = if n_pos == 0 || n_pos == n {
                // One-sided problem: constant decision.
                (vec![0.0; n], if n_pos == 0 { -1.0 } else { 1.0 })
            } else {
                let mut smo = Smo {
                    kernel: &kernel,
                    y: y.clone(),
                    alpha: vec![0.0; n],
                    bias: 0.0,
                };
                smo.run(params, &mut rng);
                (smo.alpha, smo.bias)
            };

            let coef: Vec<(usize, f64)> = alpha
                .iter()
                .zip(&y)
                .enumerate()
                .filter(|&(_, (&a, _))| a > 0.0)
                .map(|(i, (a, y))| (i, a * y))
                .collect();
            raw.push((coef, bias, y));
        }

        // Keep only rows that are a support vector for some class.
        let mut remap = vec![None; n];
        let mut support_vectors = Vec::new();
        for (coef, _, _) in &raw {
            for &(i, _) in coef {
                if remap[i].is_none() {
                    remap[i] = Some(support_vectors.len());
                    support_vectors.push(set.x[i].clone());
                }
            }
        }

        let mut machines = Vec::with_capacity(raw.len());
        for (coef, bias, y) in raw {
            let decisions: Vec<f64> = kernel
                .iter()
                .map(|row| bias + coef.iter().map(|&(i, w)| w * row[i]).sum::<f64>())
                .collect();
            let positive: Vec<bool> = y.iter().map(|&v| v > 0.0).collect();
            let (platt_a, platt_b) = fit_platt(&decisions, &positive);

            machines.push(BinaryMachine {
                coef: coef
                    .into_iter()
                    .filter_map(|(i, w)| remap[i].map(|sv| (sv, w)))
                    .collect(),
                bias,
                platt_a,
                platt_b,
            });
        }

        tracing::debug!(
            support_vectors = support_vectors.len(),
            gamma,
            "Support vector machine trained"
        );

        Ok(Self {
            support_vectors,
            machines,
            gamma,
            n_features: set.n_features,
        })
    }

    /// Raw one-vs-rest decision values.
    ///
    /// # Errors
    /// Returns `DimensionMismatch` for a vector of the wrong length.
    pub fn decision_function(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_dimensions(self.n_features, x)?;
        let kernel_row: Vec<f64> = self
            .support_vectors
            .iter()
            .map(|sv| rbf(x, sv, self.gamma))
            .collect();
        Ok(self.machines.iter().map(|m| m.decision(&kernel_row)).collect())
    }

    #[must_use]
    pub fn n_support(&self) -> usize {
        self.support_vectors.len()
    }
}

impl Classifier for SupportVectorMachine {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.machines.len()
    }

    fn predict_proba(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        let decisions = self.decision_function(x)?;
        let raw: Vec<f64> = self
            .machines
            .iter()
            .zip(&decisions)
            .map(|(m, &f)| m.probability(f))
            .collect();

        if raw.iter().any(|p| !p.is_finite()) {
            return Err(ModelError::NonFinite);
        }
        let total: f64 = raw.iter().sum();
        if total <= 0.0 {
            let k = raw.len().max(1) as f64;
            return Ok(vec![1.0 / k; raw.len()]);
        }
        Ok(raw.into_iter().map(|p| p / total).collect())
    }
}
