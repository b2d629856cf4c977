//! Environment-driven configuration.
//!
//! Every key is optional; unparsable or out-of-range values are ignored
//! with a warning and the default is kept.

use std::path::PathBuf;

use crate::adapters::models::{BoostingParams, ForestParams, LogisticParams, SvmParams};

pub const ENV_DATA_PATH: &str = "MEDISENSE_DATA_PATH";
pub const ENV_ARTIFACT_DIR: &str = "MEDISENSE_ARTIFACT_DIR";
pub const ENV_SEED: &str = "MEDISENSE_SEED";
pub const ENV_TEST_FRACTION: &str = "MEDISENSE_TEST_FRACTION";
pub const ENV_ALLOW_SAMPLE_DATA: &str = "MEDISENSE_ALLOW_SAMPLE_DATA";
pub const ENV_FOREST_TREES: &str = "MEDISENSE_FOREST_TREES";
pub const ENV_BOOSTING_STAGES: &str = "MEDISENSE_BOOSTING_STAGES";
pub const ENV_LOGISTIC_MAX_ITER: &str = "MEDISENSE_LOGISTIC_MAX_ITER";

/// Hyperparameters for each slate member.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SlateConfig {
    pub forest: ForestParams,
    pub boosting: BoostingParams,
    pub logistic: LogisticParams,
    pub svm: SvmParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Training CSV
    pub data_path: PathBuf,
    /// Directory holding the persisted ensemble
    pub artifact_dir: PathBuf,
    pub seed: u64,
    /// Held-out share of the training table, in (0, 1)
    pub test_fraction: f64,
    /// Train on the built-in sample table when `data_path` is missing
    pub allow_sample_data: bool,
    pub slate: SlateConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/symptoms.csv"),
            artifact_dir: PathBuf::from("artifacts"),
            seed: 42,
            test_fraction: 0.2,
            allow_sample_data: true,
            slate: SlateConfig::default(),
        }
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

fn ignored(key: &str, value: &str) {
    tracing::warn!(key, value, "Ignoring invalid configuration value");
}

impl AppConfig {
    /// Defaults overridden by `MEDISENSE_*` environment variables.
    #[must_use]
    pub fn from_env_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup(ENV_DATA_PATH) {
            if !v.trim().is_empty() {
                cfg.data_path = PathBuf::from(v.trim());
            }
        }

        if let Some(v) = lookup(ENV_ARTIFACT_DIR) {
            if !v.trim().is_empty() {
                cfg.artifact_dir = PathBuf::from(v.trim());
            }
        }

        if let Some(v) = lookup(ENV_SEED) {
            match v.trim().parse::<u64>() {
                Ok(seed) => cfg.seed = seed,
                Err(_) => ignored(ENV_SEED, &v),
            }
        }

        if let Some(v) = lookup(ENV_TEST_FRACTION) {
            match v.trim().parse::<f64>() {
                Ok(f) if f > 0.0 && f < 1.0 => cfg.test_fraction = f,
                _ => ignored(ENV_TEST_FRACTION, &v),
            }
        }

        if let Some(v) = lookup(ENV_ALLOW_SAMPLE_DATA) {
            match parse_bool(&v) {
                Some(b) => cfg.allow_sample_data = b,
                None => ignored(ENV_ALLOW_SAMPLE_DATA, &v),
            }
        }

        let positive = |key: &str| -> Option<usize> {
            let v = lookup(key)?;
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    ignored(key, &v);
                    None
                }
            }
        };

        if let Some(n) = positive(ENV_FOREST_TREES) {
            cfg.slate.forest.n_trees = n;
        }
        if let Some(n) = positive(ENV_BOOSTING_STAGES) {
            cfg.slate.boosting.n_stages = n;
        }
        if let Some(n) = positive(ENV_LOGISTIC_MAX_ITER) {
            cfg.slate.logistic.max_iter = n;
        }

        cfg
    }
}
