//! Training use case: split the table, fit the slate, score it.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::adapters::models::Algorithm;
use crate::adapters::SlateModel;
use crate::config::AppConfig;
use crate::domain::{
    DiseaseCatalog, LabelEncoding, ModelScore, SplitKind, TrainingSet, TrainingTable, TrainingReport,
};
use crate::ports::{Classifier, ModelBundle, BUNDLE_VERSION};
use crate::MedisenseError;

/// Train/test row indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
    pub kind: SplitKind,
}

/// Partition `y` into train/test, stratified when feasible.
///
/// Stratification needs at least two samples per present class and room for
/// every class on both sides. Otherwise a shuffled split is used. If the
/// train side would be empty, every row is used for training and the test
/// side is left empty.
#[must_use]
pub fn split_indices(y: &[usize], n_classes: usize, test_fraction: f64, seed: u64) -> Split {
    let n = y.len();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    // Absorb float noise before rounding up.
    let n_test = ((n as f64) * test_fraction - 1e-9).ceil().max(0.0) as usize;
    let n_train = n.saturating_sub(n_test);

    if n_train == 0 || n_test == 0 {
        return Split {
            train: (0..n).collect(),
            test: Vec::new(),
            kind: SplitKind::Random,
        };
    }

    let mut by_class: Vec<Vec<usize>> = vec![Vec::new(); n_classes];
    for (i, &class) in y.iter().enumerate() {
        by_class[class].push(i);
    }
    let present: Vec<&Vec<usize>> = by_class.iter().filter(|rows| !rows.is_empty()).collect();
    let stratifiable = present.iter().all(|rows| rows.len() >= 2)
        && n_test >= present.len()
        && n_train >= present.len();

    if !stratifiable {
        let mut all: Vec<usize> = (0..n).collect();
        all.shuffle(&mut rng);
        let mut test = all.split_off(n_train);
        all.sort_unstable();
        test.sort_unstable();
        return Split {
            train: all,
            test,
            kind: SplitKind::Random,
        };
    }

    // Floor each class's share, then hand out the remainder by largest
    // fractional part. Every class keeps at least one row on each side.
    let shares: Vec<f64> = by_class
        .iter()
        .map(|rows| rows.len() as f64 * n_test as f64 / n as f64)
        .collect();
    let mut per_class: Vec<usize> = by_class
        .iter()
        .zip(&shares)
        .map(|(rows, &s)| {
            if rows.is_empty() {
                0
            } else {
                (s.floor() as usize).clamp(1, rows.len() - 1)
            }
        })
        .collect();

    let mut order: Vec<usize> = (0..n_classes).filter(|&c| !by_class[c].is_empty()).collect();
    order.sort_by(|&a, &b| {
        let fa = shares[a] - shares[a].floor();
        let fb = shares[b] - shares[b].floor();
        fb.partial_cmp(&fa).unwrap_or(std::cmp::Ordering::Equal).then(a.cmp(&b))
    });

    let mut assigned: usize = per_class.iter().sum();
    while assigned < n_test {
        let Some(&class) = order
            .iter()
            .find(|&&c| per_class[c] + 1 < by_class[c].len())
        else {
            break;
        };
        per_class[class] += 1;
        assigned += 1;
        order.retain(|&c| c != class);
        order.push(class);
    }
    while assigned > n_test {
        let Some(&class) = order.iter().rev().find(|&&c| per_class[c] > 1) else {
            break;
        };
        per_class[class] -= 1;
        assigned -= 1;
    }

    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);
    for (rows, &take) in by_class.iter_mut().zip(&per_class) {
        rows.shuffle(&mut rng);
        test.extend_from_slice(&rows[..take]);
        train.extend_from_slice(&rows[take..]);
    }
    train.sort_unstable();
    test.sort_unstable();

    Split {
        train,
        test,
        kind: SplitKind::Stratified,
    }
}

/// Fraction of `set` a classifier labels correctly; `None` for an empty set.
/// Inference errors count as misses.
#[must_use]
pub fn accuracy<C: Classifier + ?Sized>(model: &C, set: &TrainingSet) -> Option<f64> {
    if set.is_empty() {
        return None;
    }
    let correct = set
        .x
        .iter()
        .zip(&set.y)
        .filter(|&(row, &label)| matches!(model.predict_one(row), Ok((class, _)) if class == label))
        .count();
    Some(correct as f64 / set.len() as f64)
}

/// Fit the whole slate on `table` and package it for persistence.
///
/// Slate members train in parallel. A member that fails to train is left
/// out with a warning; all trained members are kept regardless of accuracy.
///
/// # Errors
/// Returns `VocabularyUnavailable` for a table without symptom columns, and
/// `Training` for an empty table or when no member could be trained.
pub fn train_slate(
    table: &TrainingTable,
    config: &AppConfig,
) -> Result<ModelBundle<SlateModel>, MedisenseError> {
    if table.vocabulary.is_empty() {
        return Err(MedisenseError::VocabularyUnavailable);
    }
    if table.is_empty() {
        return Err(MedisenseError::Training("Training table has no rows".to_string()));
    }

    let labels = LabelEncoding::fit(&table.labels);
    let set = table
        .to_training_set(&labels)
        .map_err(MedisenseError::Training)?;

    let split = split_indices(&set.y, set.n_classes, config.test_fraction, config.seed);
    if split.kind == SplitKind::Random {
        tracing::info!("Stratified split infeasible, using random split");
    }
    let train_set = set.subset(&split.train);
    let test_set = set.subset(&split.test);

    tracing::info!(
        train_rows = train_set.len(),
        test_rows = test_set.len(),
        symptoms = set.n_features,
        diseases = set.n_classes,
        "Training model slate"
    );

    let fitted: Vec<(Algorithm, Result<SlateModel, _>)> = Algorithm::SLATE
        .par_iter()
        .map(|algorithm| (*algorithm, algorithm.fit(&train_set, &config.slate, config.seed)))
        .collect();

    let mut models = Vec::with_capacity(fitted.len());
    let mut scores = Vec::with_capacity(fitted.len());
    for (algorithm, result) in fitted {
        match result {
            Ok(model) => {
                let acc = accuracy(&model, &test_set);
                match acc {
                    Some(acc) => tracing::info!(model = %algorithm, accuracy = acc, "Model trained"),
                    None => tracing::info!(model = %algorithm, "Model trained (no held-out rows)"),
                }
                scores.push(ModelScore {
                    name: algorithm.name().to_string(),
                    accuracy: acc,
                });
                models.push(model);
            }
            Err(e) => tracing::warn!(model = %algorithm, error = %e, "Model failed to train"),
        }
    }

    if models.is_empty() {
        return Err(MedisenseError::Training(
            "No model in the slate could be trained".to_string(),
        ));
    }

    let report = TrainingReport {
        trained_at: chrono::Utc::now(),
        split: split.kind,
        train_rows: train_set.len(),
        test_rows: test_set.len(),
        n_features: set.n_features,
        n_classes: set.n_classes,
        scores,
    };
    if let Some(best) = report.best_model() {
        tracing::info!(
            model = %best.name,
            accuracy = best.accuracy.unwrap_or_default(),
            "Best model"
        );
    }

    Ok(ModelBundle {
        version: BUNDLE_VERSION,
        vocabulary: table.vocabulary.clone(),
        labels,
        models,
        report,
        catalog: DiseaseCatalog::from_table(table),
    })
}
