//! Built-in sample table and source chaining.

use crate::domain::{SymptomVocabulary, TrainingTable};
use crate::ports::{SourceError, TrainingSource};

const SAMPLE_SYMPTOMS: [&str; 5] = ["fever", "cough", "headache", "fatigue", "sore_throat"];

const SAMPLE_ROWS: [(&str, [u8; 5]); 5] = [
    ("Common Cold", [1, 1, 0, 1, 1]),
    ("Flu", [1, 1, 1, 1, 1]),
    ("Headache", [0, 0, 1, 1, 0]),
    ("Fever", [1, 0, 0, 1, 0]),
    ("Cough", [0, 1, 0, 0, 0]),
];

/// Five-disease demonstration table used when no training file exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampleTrainingSource;

impl TrainingSource for SampleTrainingSource {
    fn load_table(&self) -> Result<TrainingTable, SourceError> {
        let vocabulary = SymptomVocabulary::new(SAMPLE_SYMPTOMS).map_err(SourceError::Malformed)?;
        let (labels, rows): (Vec<String>, Vec<Vec<f64>>) = SAMPLE_ROWS
            .iter()
            .map(|(disease, bits)| {
                (
                    (*disease).to_string(),
                    bits.iter().map(|&b| f64::from(b)).collect::<Vec<_>>(),
                )
            })
            .unzip();
        TrainingTable::new(vocabulary, rows, labels).map_err(SourceError::Malformed)
    }

    fn describe(&self) -> String {
        "built-in sample".to_string()
    }
}

/// Try `primary`; on `NotFound` use `secondary`.
///
/// Other primary errors (malformed data) are returned as-is so a broken file
/// is never silently replaced by sample data.
pub struct FallbackChainSource<P, S> {
    primary: P,
    secondary: S,
}

impl<P: TrainingSource, S: TrainingSource> FallbackChainSource<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P: TrainingSource, S: TrainingSource> TrainingSource for FallbackChainSource<P, S> {
    fn load_table(&self) -> Result<TrainingTable, SourceError> {
        match self.primary.load_table() {
            Err(SourceError::NotFound(what)) => {
                tracing::warn!(
                    missing = %what,
                    fallback = %self.secondary.describe(),
                    "Training data not found, using fallback source"
                );
                self.secondary.load_table()
            }
            other => other,
        }
    }

    fn describe(&self) -> String {
        format!("{} -> {}", self.primary.describe(), self.secondary.describe())
    }
}
