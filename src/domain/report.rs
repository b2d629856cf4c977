//! Training diagnostics recorded alongside a trained ensemble.

use serde::{Deserialize, Serialize};

/// How the training table was partitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitKind {
    /// Per-class proportions preserved
    Stratified,
    /// Plain shuffled split (stratification infeasible)
    Random,
}

/// Held-out accuracy of one slate member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub name: String,
    /// `None` when the held-out partition is empty
    pub accuracy: Option<f64>,
}

/// Summary of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub trained_at: chrono::DateTime<chrono::Utc>,
    pub split: SplitKind,
    pub train_rows: usize,
    pub test_rows: usize,
    pub n_features: usize,
    pub n_classes: usize,
    pub scores: Vec<ModelScore>,
}

impl TrainingReport {
    /// First model with the highest held-out accuracy.
    #[must_use]
    pub fn best_model(&self) -> Option<&ModelScore> {
        let mut best: Option<&ModelScore> = None;
        for score in &self.scores {
            let Some(acc) = score.accuracy else { continue };
            match best.and_then(|b| b.accuracy) {
                Some(best_acc) if acc <= best_acc => {}
                _ => best = Some(score),
            }
        }
        best
    }
}
