//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external formats:
//! - `models`: the hand-written algorithm slate
//! - `csv_source`: `csv` crate ingestion of the symptom table
//! - `sample_source`: built-in demonstration table and source chaining
//! - `json_store`: `serde_json` artifacts bound by a SHA-256 manifest

pub mod csv_source;
pub mod json_store;
pub mod models;
pub mod sample_source;

pub use csv_source::CsvTrainingSource;
pub use json_store::{JsonModelStore, StoreError};
pub use models::{Algorithm, SlateModel};
pub use sample_source::{FallbackChainSource, SampleTrainingSource};
