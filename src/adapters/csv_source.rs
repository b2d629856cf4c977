//! CSV training source.
//!
//! Expected shape: one `diseases` label column (anywhere) and one column per
//! symptom. Symptom columns become the vocabulary in file order. Cells are
//! binarized: empty → 0, any non-zero number → 1.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::domain::{SymptomVocabulary, TrainingTable};
use crate::ports::{SourceError, TrainingSource};

/// Name of the label column.
pub const LABEL_COLUMN: &str = "diseases";

pub struct CsvTrainingSource {
    path: PathBuf,
}

impl CsvTrainingSource {
    #[must_use]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse a table from any reader.
    ///
    /// # Errors
    /// Returns `Malformed` for a missing label column, duplicate symptom
    /// columns, or non-numeric cells.
    pub fn parse<R: Read>(reader: R) -> Result<TrainingTable, SourceError> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let label_idx = headers
            .iter()
            .position(|h| h == LABEL_COLUMN)
            .ok_or_else(|| SourceError::Malformed(format!("Missing '{LABEL_COLUMN}' column")))?;

        let feature_columns: Vec<usize> = (0..headers.len()).filter(|&i| i != label_idx).collect();
        let vocabulary = SymptomVocabulary::new(feature_columns.iter().filter_map(|&i| headers.get(i)))
            .map_err(SourceError::Malformed)?;

        let mut rows = Vec::new();
        let mut labels = Vec::new();
        let mut skipped = 0usize;

        for (line, record) in csv.records().enumerate() {
            let record = record?;
            let label = record.get(label_idx).unwrap_or("");
            if label.is_empty() {
                skipped += 1;
                continue;
            }

            let mut row = Vec::with_capacity(feature_columns.len());
            for &col in &feature_columns {
                let cell = record.get(col).unwrap_or("");
                let value = if cell.is_empty() {
                    0.0
                } else {
                    cell.parse::<f64>().map_err(|_| {
                        SourceError::Malformed(format!(
                            "Row {} column '{}': non-numeric value {cell:?}",
                            line + 2,
                            headers.get(col).unwrap_or("?")
                        ))
                    })?
                };
                row.push(if value != 0.0 { 1.0 } else { 0.0 });
            }
            rows.push(row);
            labels.push(label.to_string());
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Skipped rows without a disease label");
        }

        TrainingTable::new(vocabulary, rows, labels).map_err(SourceError::Malformed)
    }
}

impl TrainingSource for CsvTrainingSource {
    fn load_table(&self) -> Result<TrainingTable, SourceError> {
        if !self.path.exists() {
            return Err(SourceError::NotFound(self.path.display().to_string()));
        }
        let file = std::fs::File::open(&self.path)?;
        let table = Self::parse(file)?;
        tracing::info!(
            path = %self.path.display(),
            rows = table.len(),
            symptoms = table.vocabulary.len(),
            "Training data loaded"
        );
        Ok(table)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}
