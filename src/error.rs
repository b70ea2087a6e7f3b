//! Error taxonomy shared by the preparation pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by loading, labelling, batching and exporting.
///
/// Every failure propagates straight to the caller; nothing is retried or
/// partially returned unless the fetch configuration asks for retries.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The provider could not deliver a split (network, HTTP status, missing file).
    #[error("dataset {dataset} split {split} unavailable: {reason}")]
    DatasetUnavailable {
        dataset: String,
        split: String,
        reason: String,
    },
    /// A fetched row lacks an expected field or carries the wrong type.
    #[error("schema mismatch in split {split} row {row}: {detail}")]
    SchemaMismatch {
        split: String,
        row: usize,
        detail: String,
    },
    /// A score that is not a finite number in `[0, 1]`.
    #[error("invalid score at index {index}: {value}")]
    InvalidScore { index: usize, value: f32 },
    /// Any other malformed caller input (lengths, fractions, batch sizes).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The export target could not be created or written.
    #[error("failed to persist model at {path}: {source}")]
    Persistence {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The configuration file could not be read or parsed.
    #[error("invalid configuration at {path}: {detail}")]
    Config { path: PathBuf, detail: String },
}

impl PipelineError {
    pub(crate) fn unavailable(
        dataset: impl Into<String>,
        split: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::DatasetUnavailable {
            dataset: dataset.into(),
            split: split.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn schema(split: impl Into<String>, row: usize, detail: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            split: split.into(),
            row,
            detail: detail.into(),
        }
    }
}
