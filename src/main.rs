//! Medisense: Symptom-driven disease classification
//!
//! Command-line entry point. Results are printed to stdout as JSON; logs go
//! to stderr unless `MEDISENSE_LOG_MODE` says otherwise.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use medisense::adapters::JsonModelStore;
use medisense::application::configured_source;
use medisense::{AppConfig, DiseasePredictor, Gender, Observation};

#[derive(Debug, Parser)]
#[command(name = "medisense", version, about = "Symptom-driven disease prediction")]
struct Cli {
    /// Training CSV (overrides MEDISENSE_DATA_PATH)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Model artifact directory (overrides MEDISENSE_ARTIFACT_DIR)
    #[arg(long, global = true)]
    artifacts: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Retrain the model slate and persist it
    Train,
    /// Predict a disease for one observation
    Predict(PredictArgs),
    /// List the symptom vocabulary
    Symptoms,
    /// List the diseases the ensemble can predict
    Diseases,
}

#[derive(Debug, Args)]
struct PredictArgs {
    /// Observation as a JSON file
    #[arg(long, conflicts_with_all = ["age", "height", "weight", "gender", "temperature", "symptoms", "additional"])]
    input: Option<PathBuf>,

    #[arg(long, required_unless_present = "input")]
    age: Option<u32>,

    /// Height in cm
    #[arg(long, required_unless_present = "input")]
    height: Option<f64>,

    /// Weight in kg
    #[arg(long, required_unless_present = "input")]
    weight: Option<f64>,

    #[arg(long, default_value = "other")]
    gender: Gender,

    /// Body temperature in °C
    #[arg(long, default_value_t = 36.6)]
    temperature: f64,

    /// Comma-separated symptom names from the vocabulary
    #[arg(long, value_delimiter = ',')]
    symptoms: Vec<String>,

    /// Free-text, comma-separated extra symptoms
    #[arg(long, default_value = "")]
    additional: String,
}

impl PredictArgs {
    fn observation(&self) -> Result<Observation> {
        if let Some(path) = &self.input {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            return serde_json::from_str(&content)
                .with_context(|| format!("Invalid observation in {}", path.display()));
        }

        let (Some(age), Some(height), Some(weight)) = (self.age, self.height, self.weight) else {
            bail!("--age, --height and --weight are required without --input");
        };
        Ok(Observation::new(age, self.gender, height, weight, self.temperature)?
            .with_symptoms(self.symptoms.iter().map(|s| s.trim().to_string()))
            .with_additional_symptoms(self.additional.clone()))
    }
}

fn main() -> Result<()> {
    // Initialize logging.
    //
    // stdout carries the JSON results, so the default sink is stderr.
    let log_mode = std::env::var("MEDISENSE_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let (writer, _guard) = match log_mode.as_str() {
        "file" => {
            let log_file = std::env::var("MEDISENSE_LOG_FILE")
                .unwrap_or_else(|_| "medisense.log".to_string());

            if let Some(parent) = std::path::Path::new(&log_file).parent() {
                // Best-effort: don't fail startup just because the directory is missing.
                let _ = std::fs::create_dir_all(parent);
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)?;
            tracing_appender::non_blocking(file)
        }
        "stdout" => tracing_appender::non_blocking(std::io::stdout()),
        // auto
        _ => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env_or_default();
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(artifacts) = cli.artifacts {
        config.artifact_dir = artifacts;
    }

    match cli.command {
        Command::Train => {
            let source = configured_source(&config);
            let store = JsonModelStore::new(&config.artifact_dir);
            let predictor = DiseasePredictor::retrain(&config, source.as_ref(), &store)?;
            let report = predictor
                .training_report()
                .context("Training produced no report")?;
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        Command::Predict(args) => {
            let observation = args.observation()?;
            if let Err(errors) = observation.validate() {
                bail!("Invalid observation:\n  {}", errors.join("\n  "));
            }
            let predictor = DiseasePredictor::from_config(&config);
            let result = predictor.predict(&observation);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Symptoms => {
            let predictor = DiseasePredictor::from_config(&config);
            let Some(vocabulary) = predictor.vocabulary() else {
                bail!("No trained model available; symptom vocabulary unknown");
            };
            for symptom in vocabulary.sorted() {
                println!("{symptom}");
            }
        }
        Command::Diseases => {
            let predictor = DiseasePredictor::from_config(&config);
            if !predictor.is_model_ready() {
                bail!("No trained model available");
            }
            for disease in predictor.diseases() {
                println!("{disease}");
            }
        }
    }

    Ok(())
}
