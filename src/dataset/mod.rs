//! Training dataset loading and leakage-safe feature selection.

use std::path::PathBuf;

use thiserror::Error;

pub mod csv;
pub mod schema;
mod selector;

pub use csv::{CsvTable, parse_csv, read_csv};
pub use schema::{
    ColumnRole, ColumnSpec, LABEL_COLUMN, SCHEMA, SchemaReport, classify_header,
    permitted_features, role_of,
};
pub use selector::{FeatureSelection, select_features};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed CSV at line {line}: {message}")]
    Csv { line: usize, message: String },
    #[error("CSV line {line} has {found} fields but the header has {expected}")]
    RaggedRow {
        line: usize,
        found: usize,
        expected: usize,
    },
    /// The label column is absent; the run cannot continue.
    #[error("Label column '{column}' not found in dataset")]
    MissingLabel { column: &'static str },
    #[error("Row {row}: column '{column}' is not numeric ({value:?})")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },
    /// Only the label column survived selection.
    #[error("Dataset has no pre-release feature columns")]
    NoFeatures,
    #[error("Row {row}: label must be 0 or 1, got {value:?}")]
    InvalidLabel { row: usize, value: String },
    /// A class has fewer rows than the evaluation folds need.
    #[error("Class '{class}' has {count} samples; at least {needed} are required")]
    TooFewSamples {
        class: &'static str,
        count: usize,
        needed: usize,
    },
}
