//! Sentiment dataset preparation: load SST splits, binarize scores, batch
//! them for a trainer and export trained models to timestamped folders.

/// Config, log and cache directory resolution.
pub mod app_dirs;
/// TOML pipeline configuration.
pub mod config;
/// Providers, validated splits, holdout re-split and batching.
pub mod dataset;
/// Error taxonomy.
pub mod error;
/// Timestamped model export directories.
pub mod export;
/// Training-history chart descriptions.
pub mod history;
/// Shared HTTP agent and retry helpers.
pub mod http_client;
/// Binary labels from continuous scores.
pub mod labels;
/// Tracing subscriber setup.
pub mod logging;

pub use error::PipelineError;
