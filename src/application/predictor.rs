//! Disease predictor: the immutable context every prediction runs against.
//!
//! This service coordinates:
//! - Loading a persisted ensemble, or training and saving a new one
//! - Feature encoding against the trained vocabulary
//! - Ensemble voting and aggregation
//! - Risk scoring and advice
//! - The keyword fallback when no model can vote

use crate::adapters::{CsvTrainingSource, FallbackChainSource, JsonModelStore, SampleTrainingSource, SlateModel};
use crate::config::AppConfig;
use crate::domain::{
    encode, DiseaseCatalog, HealthSummary, Observation, PredictionResult, SymptomVocabulary, TrainingReport,
};
use crate::ports::{ModelBundle, ModelStore, TrainingSource};
use crate::MedisenseError;

use super::aggregate::aggregate;
use super::ensemble::Ensemble;
use super::fallback::fallback;
use super::training::train_slate;
use super::{advice, risk};

/// Trained artifacts shared read-only by every prediction.
pub struct ModelContext {
    pub vocabulary: SymptomVocabulary,
    pub ensemble: Ensemble,
    pub catalog: DiseaseCatalog,
    pub report: Option<TrainingReport>,
}

impl ModelContext {
    #[must_use]
    pub fn from_bundle(bundle: ModelBundle<SlateModel>) -> Self {
        Self {
            vocabulary: bundle.vocabulary,
            ensemble: Ensemble::from_models(bundle.models, bundle.labels),
            catalog: bundle.catalog,
            report: Some(bundle.report),
        }
    }
}

/// Training source for a configuration: the CSV file, backed by the
/// built-in sample table when `allow_sample_data` is set.
#[must_use]
pub fn configured_source(config: &AppConfig) -> Box<dyn TrainingSource> {
    let csv = CsvTrainingSource::new(&config.data_path);
    if config.allow_sample_data {
        Box::new(FallbackChainSource::new(csv, SampleTrainingSource))
    } else {
        Box::new(csv)
    }
}

/// Symptom-to-disease predictor.
///
/// Built once by [`DiseasePredictor::initialize`] and then shared (for
/// example behind an `Arc`); prediction takes `&self` only.
pub struct DiseasePredictor {
    context: Option<ModelContext>,
}

impl DiseasePredictor {
    /// Load a compatible persisted ensemble, or train and persist a new one.
    ///
    /// Never fails: when neither is possible the predictor runs in
    /// fallback-only mode.
    pub fn initialize<S, M>(config: &AppConfig, source: &S, store: &M) -> Self
    where
        S: TrainingSource + ?Sized,
        M: ModelStore,
    {
        tracing::info!("Initializing disease predictor...");

        match store.load::<SlateModel>() {
            Ok(Some(bundle)) => {
                tracing::info!(
                    models = bundle.models.len(),
                    symptoms = bundle.vocabulary.len(),
                    "Loaded persisted model bundle"
                );
                return Self::from_context(ModelContext::from_bundle(bundle));
            }
            Ok(None) => tracing::info!("No persisted model bundle, training a new one"),
            Err(e) => tracing::info!(error = %e, "Persisted model bundle unusable, retraining"),
        }

        match Self::train_and_save(config, source, store) {
            Ok(context) => Self::from_context(context),
            Err(e) => {
                tracing::error!(error = %e, "Model training failed, running in fallback-only mode");
                Self::fallback_only()
            }
        }
    }

    /// [`initialize`](Self::initialize) with the configured CSV source and
    /// JSON store.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let source = configured_source(config);
        let store = JsonModelStore::new(&config.artifact_dir);
        Self::initialize(config, source.as_ref(), &store)
    }

    /// Train from `source` and overwrite whatever the store holds.
    ///
    /// # Errors
    /// Returns the training or data-loading error; a failed save is only
    /// logged.
    pub fn retrain<S, M>(config: &AppConfig, source: &S, store: &M) -> Result<Self, MedisenseError>
    where
        S: TrainingSource + ?Sized,
        M: ModelStore,
    {
        Self::train_and_save(config, source, store).map(Self::from_context)
    }

    fn train_and_save<S, M>(config: &AppConfig, source: &S, store: &M) -> Result<ModelContext, MedisenseError>
    where
        S: TrainingSource + ?Sized,
        M: ModelStore,
    {
        tracing::info!(source = %source.describe(), "Loading training data");
        let table = source.load_table()?;
        let bundle = train_slate(&table, config)?;

        if let Err(e) = store.save(&bundle) {
            tracing::warn!(error = %e, "Failed to persist model bundle");
        }
        Ok(ModelContext::from_bundle(bundle))
    }

    #[must_use]
    pub fn from_context(context: ModelContext) -> Self {
        Self {
            context: Some(context),
        }
    }

    /// Predictor that always answers with the keyword rules.
    #[must_use]
    pub fn fallback_only() -> Self {
        Self { context: None }
    }

    /// Predict a disease for one observation. Never fails.
    ///
    /// The observation is not validated here; callers reject empty symptom
    /// sets beforehand.
    #[must_use]
    pub fn predict(&self, observation: &Observation) -> PredictionResult {
        let Some(context) = &self.context else {
            tracing::debug!("No trained ensemble, using keyword rules");
            return Self::keyword_fallback(observation);
        };

        let features = match encode(
            &context.vocabulary,
            observation.symptoms(),
            observation.additional_symptoms_raw(),
        ) {
            Ok(features) => features,
            Err(e) => {
                tracing::warn!(error = %e, "Feature encoding failed, using keyword rules");
                return Self::keyword_fallback(observation);
            }
        };
        tracing::debug!(active = features.active_count(), "Observation encoded");

        let votes = match context.ensemble.predict_all(&features) {
            Ok(votes) => votes,
            Err(e) => {
                tracing::warn!(error = %e, "Ensemble produced no vote, using keyword rules");
                return Self::keyword_fallback(observation);
            }
        };
        let Some(outcome) = aggregate(&votes) else {
            return Self::keyword_fallback(observation);
        };

        let explanation = advice::explain(observation, &outcome.disease);
        let result = PredictionResult {
            risk_level: risk::assess(observation, &outcome.disease),
            confidence: outcome.confidence,
            alternative_diseases: outcome.alternatives,
            key_indicators: explanation.key_indicators,
            recommendations: explanation.recommendations,
            model_predictions: votes
                .iter()
                .map(|v| (v.model.clone(), v.disease.clone()))
                .collect(),
            disease_info: context.catalog.get(&outcome.disease).cloned(),
            health: HealthSummary::from_observation(observation),
            fallback: false,
            created_at: chrono::Utc::now(),
            predicted_disease: outcome.disease,
        };

        tracing::info!(
            disease = %result.predicted_disease,
            confidence = result.confidence,
            risk = %result.risk_level,
            votes = votes.len(),
            "Prediction complete"
        );
        result
    }

    fn keyword_fallback(observation: &Observation) -> PredictionResult {
        let result = fallback(observation);
        tracing::info!(
            disease = %result.predicted_disease,
            risk = %result.risk_level,
            "Prediction complete (fallback)"
        );
        result
    }

    /// Trained vocabulary, if a model is loaded.
    #[must_use]
    pub fn vocabulary(&self) -> Option<&SymptomVocabulary> {
        self.context.as_ref().map(|c| &c.vocabulary)
    }

    /// Disease names the ensemble can predict, sorted.
    #[must_use]
    pub fn diseases(&self) -> Vec<&str> {
        self.context
            .as_ref()
            .map(|c| c.ensemble.labels().classes().iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn training_report(&self) -> Option<&TrainingReport> {
        self.context.as_ref().and_then(|c| c.report.as_ref())
    }

    /// Whether a trained ensemble with at least one member is loaded.
    #[must_use]
    pub fn is_model_ready(&self) -> bool {
        self.context.as_ref().is_some_and(|c| !c.ensemble.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::models::{BoostingParams, ForestParams};
    use crate::application::ensemble::fixtures::{voting, FailingModel};
    use crate::config::SlateConfig;
    use crate::domain::{Gender, LabelEncoding, RiskLevel};
    use crate::ports::Classifier;
    use tempfile::TempDir;

    const SYMPTOMS: [&str; 5] = ["fever", "cough", "headache", "fatigue", "sore_throat"];

    fn vocabulary() -> SymptomVocabulary {
        SymptomVocabulary::new(SYMPTOMS).expect("Should build")
    }

    fn context(members: Vec<Box<dyn Classifier>>) -> ModelContext {
        ModelContext {
            vocabulary: vocabulary(),
            ensemble: Ensemble::new(members, LabelEncoding::fit(["Common Cold", "Flu"])),
            catalog: DiseaseCatalog::default(),
            report: None,
        }
    }

    fn scenario() -> Observation {
        Observation::new(28, Gender::Male, 175.0, 70.0, 38.2)
            .expect("Should build")
            .with_symptoms(["fever", "cough", "headache", "fatigue"])
    }

    fn fast_config(dir: &TempDir) -> AppConfig {
        AppConfig {
            data_path: dir.path().join("missing.csv"),
            artifact_dir: dir.path().join("artifacts"),
            slate: SlateConfig {
                forest: ForestParams {
                    n_trees: 10,
                    ..ForestParams::default()
                },
                boosting: BoostingParams {
                    n_stages: 10,
                    ..BoostingParams::default()
                },
                ..SlateConfig::default()
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_end_to_end_two_model_scenario() {
        let predictor = DiseasePredictor::from_context(context(vec![
            Box::new(voting("A", 2, 0, 0.8, 5)),
            Box::new(voting("B", 2, 0, 0.9, 5)),
        ]));

        let result = predictor.predict(&scenario());
        assert_eq!(result.predicted_disease, "Common Cold");
        assert!((result.confidence - 85.0).abs() < 1e-9);
        // BMI 22.86 (0) + 38.2 °C (1) + 4 symptoms (0) + no keyword (0) = 1
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(!result.fallback);
        assert_eq!(result.vote_count(), 2);
        assert_eq!(result.model_predictions.get("A").map(String::as_str), Some("Common Cold"));
        assert_eq!(result.alternative_diseases.len(), 2);
        assert_eq!(result.alternative_diseases[0].source_model, "B");
        assert_eq!(
            result.key_indicators,
            vec![
                "Elevated temperature (38.2°C)",
                "Presenting symptoms: fever, cough, headache",
            ]
        );
        assert_eq!(result.recommendations[0], "Get plenty of rest and sleep");
        assert!(result.disease_info.is_none());
    }

    #[test]
    fn test_majority_beats_confidence() {
        let predictor = DiseasePredictor::from_context(context(vec![
            Box::new(voting("A", 2, 1, 0.55, 5)),
            Box::new(voting("B", 2, 1, 0.6, 5)),
            Box::new(voting("C", 2, 0, 0.99, 5)),
        ]));
        let result = predictor.predict(&scenario());
        assert_eq!(result.predicted_disease, "Flu");
        assert!(result.alternative_diseases.len() <= 3);
        assert_eq!(result.alternative_diseases[0].disease, "Common Cold");
    }

    #[test]
    fn test_single_failing_model_falls_back() {
        let predictor = DiseasePredictor::from_context(context(vec![Box::new(FailingModel)]));
        assert!(predictor.is_model_ready());

        let observation = Observation::new(40, Gender::Female, 165.0, 60.0, 39.0)
            .expect("Should build")
            .with_symptoms(["cough", "fatigue"]);
        let result = predictor.predict(&observation);
        assert!(result.fallback);
        assert_eq!(result.predicted_disease, "Flu");
        assert!((result.confidence - 60.0).abs() < f64::EPSILON);
        assert_eq!(result.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_fallback_only_predictor() {
        let predictor = DiseasePredictor::fallback_only();
        assert!(!predictor.is_model_ready());
        assert!(predictor.vocabulary().is_none());
        assert!(predictor.diseases().is_empty());
        assert!(predictor.training_report().is_none());
        assert!(predictor.predict(&scenario()).fallback);
    }

    #[test]
    fn test_initialize_trains_saves_then_loads() {
        let dir = TempDir::new().expect("Should create temp dir");
        let config = fast_config(&dir);
        let store = JsonModelStore::new(&config.artifact_dir);

        let trained = DiseasePredictor::initialize(&config, &SampleTrainingSource, &store);
        assert!(trained.is_model_ready());
        assert!(store.exists());
        assert_eq!(
            trained.diseases(),
            vec!["Common Cold", "Cough", "Fever", "Flu", "Headache"]
        );
        let trained_at = trained.training_report().expect("Should have report").trained_at;

        // A source that cannot load proves the second start reads the store.
        let missing = CsvTrainingSource::new(dir.path().join("nope.csv"));
        let loaded = DiseasePredictor::initialize(&config, &missing, &store);
        assert!(loaded.is_model_ready());
        assert_eq!(loaded.training_report().expect("Should have report").trained_at, trained_at);
        assert_eq!(loaded.vocabulary().expect("Should have vocabulary").len(), 5);

        let result = loaded.predict(&scenario());
        assert!(!result.fallback);
        assert!(result.vote_count() >= 1);
        assert!(result.alternative_diseases.len() <= 3);
        assert!((0.0..=100.0).contains(&result.confidence));
        assert!(result.disease_info.is_some());
    }

    #[test]
    fn test_corrupt_store_triggers_retrain() {
        let dir = TempDir::new().expect("Should create temp dir");
        let config = fast_config(&dir);
        let store = JsonModelStore::new(&config.artifact_dir);
        std::fs::create_dir_all(&config.artifact_dir).expect("Should create dir");
        std::fs::write(config.artifact_dir.join("ensemble.json"), b"garbage").expect("Should write");

        let predictor = DiseasePredictor::initialize(&config, &SampleTrainingSource, &store);
        assert!(predictor.is_model_ready());
        assert!(store.load::<SlateModel>().expect("Should load").is_some());
    }

    #[test]
    fn test_bundle_without_models_triggers_retrain() {
        let dir = TempDir::new().expect("Should create temp dir");
        let config = fast_config(&dir);
        let store = JsonModelStore::new(&config.artifact_dir);

        let table = SampleTrainingSource.load_table().expect("Should load sample");
        let mut empty = train_slate(&table, &config).expect("Should train");
        empty.models.clear();
        store.save(&empty).expect("Should save");

        let predictor = DiseasePredictor::initialize(&config, &SampleTrainingSource, &store);
        assert!(predictor.is_model_ready());
        let reloaded = store
            .load::<SlateModel>()
            .expect("Should load")
            .expect("Should have bundle");
        assert!(!reloaded.models.is_empty());
    }

    #[test]
    fn test_no_data_means_fallback_only() {
        let dir = TempDir::new().expect("Should create temp dir");
        let config = AppConfig {
            allow_sample_data: false,
            ..fast_config(&dir)
        };

        let predictor = DiseasePredictor::from_config(&config);
        assert!(!predictor.is_model_ready());
        assert!(predictor.predict(&scenario()).fallback);

        let store = JsonModelStore::new(&config.artifact_dir);
        let source = configured_source(&config);
        assert!(DiseasePredictor::retrain(&config, source.as_ref(), &store).is_err());
    }

    #[test]
    fn test_predictor_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DiseasePredictor>();
    }
}
