//! Training source port: where the symptom-to-disease table comes from.

use crate::domain::TrainingTable;

/// Errors that can occur while loading training data.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Training data not found: {0}")]
    NotFound(String),

    #[error("Malformed training data: {0}")]
    Malformed(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for training data ingestion.
///
/// The column names (minus the label column) become the symptom vocabulary
/// verbatim, in source order.
pub trait TrainingSource: Send + Sync {
    /// Load the full training table.
    ///
    /// # Errors
    /// Returns `NotFound` if no data is available, `Malformed` if the shape
    /// or values are invalid.
    fn load_table(&self) -> Result<TrainingTable, SourceError>;

    /// Short description for logs.
    fn describe(&self) -> String;
}
