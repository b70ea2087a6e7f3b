//! TOML configuration for corpus identity, fetching, batching and export.
//!
//! Every key is optional; a missing file yields the defaults: sst/default,
//! batch size 32, seed 42, 20% holdout and the `training` subset on both
//! pools.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app_dirs;
use crate::dataset::batch::{
    BatchConfig, DEFAULT_BATCH_SIZE, DEFAULT_HOLDOUT_FRACTION, DEFAULT_SEED,
};
use crate::dataset::holdout::{Holdout, Subset};
use crate::dataset::loader::BatchedLoadOptions;
use crate::dataset::provider::{DEFAULT_ENDPOINT, MAX_PAGE_SIZE};
use crate::dataset::{CorpusId, RowSchema};
use crate::error::PipelineError;
use crate::http_client::RetryConfig;

/// Default filename of the configuration inside the app directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub corpus: CorpusSettings,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub batching: BatchingSettings,
    #[serde(default)]
    pub export: ExportSettings,
}

/// Which corpus to load and how its rows are named.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusSettings {
    #[serde(default = "default_dataset_id")]
    pub dataset_id: String,
    #[serde(default = "default_config_name")]
    pub config_name: String,
    #[serde(default = "default_text_field")]
    pub text_field: String,
    #[serde(default = "default_score_field")]
    pub score_field: String,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            dataset_id: default_dataset_id(),
            config_name: default_config_name(),
            text_field: default_text_field(),
            score_field: default_score_field(),
        }
    }
}

/// Network fetch settings for the datasets-server provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Attempts per page, including the first; `1` disables retries.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    /// Keep fetched splits in the app cache directory.
    #[serde(default = "default_true")]
    pub cache: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            page_size: default_page_size(),
            max_attempts: default_max_attempts(),
            cache: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchingSettings {
    #[serde(default)]
    pub train: PoolBatching,
    #[serde(default)]
    pub eval: PoolBatching,
}

/// Which side of the holdout re-split to keep; `all` skips the re-split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubsetSetting {
    All,
    Training,
    Validation,
}

/// Batching of one pool (training split, or validation+test).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolBatching {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// `false` keeps the provider's order.
    #[serde(default = "default_true")]
    pub shuffle: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_holdout_fraction")]
    pub holdout_fraction: f64,
    #[serde(default = "default_subset")]
    pub subset: SubsetSetting,
}

impl Default for PoolBatching {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            shuffle: true,
            seed: default_seed(),
            holdout_fraction: default_holdout_fraction(),
            subset: default_subset(),
        }
    }
}

impl PoolBatching {
    pub fn to_batch_config(&self) -> Result<BatchConfig, PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidInput(
                "batch_size must be at least 1".to_string(),
            ));
        }
        let holdout = match self.subset {
            SubsetSetting::All => None,
            SubsetSetting::Training => Some(Holdout::new(self.holdout_fraction, Subset::Training)?),
            SubsetSetting::Validation => {
                Some(Holdout::new(self.holdout_fraction, Subset::Validation)?)
            }
        };
        Ok(BatchConfig {
            batch_size: self.batch_size,
            shuffle_seed: self.shuffle.then_some(self.seed),
            holdout,
        })
    }
}

/// Where trained models are exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_export_root")]
    pub root: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            root: default_export_root(),
        }
    }
}

impl PipelineConfig {
    pub fn corpus_id(&self) -> CorpusId {
        CorpusId::new(&self.corpus.dataset_id, &self.corpus.config_name)
    }

    pub fn row_schema(&self) -> RowSchema {
        RowSchema {
            text_field: self.corpus.text_field.clone(),
            score_field: self.corpus.score_field.clone(),
        }
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::attempts(self.fetch.max_attempts)
    }

    pub fn batched_load_options(&self) -> Result<BatchedLoadOptions, PipelineError> {
        Ok(BatchedLoadOptions {
            train: self.batching.train.to_batch_config()?,
            eval: self.batching.eval.to_batch_config()?,
        })
    }
}

/// Resolve the default config path inside the app directory.
pub fn config_path() -> Result<PathBuf, PipelineError> {
    let dir = app_dirs::app_root_dir().map_err(|err| PipelineError::Config {
        path: PathBuf::from(app_dirs::APP_DIR_NAME),
        detail: err.to_string(),
    })?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load the config at `path`, or the app default location when `None`.
///
/// A missing file yields defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<PipelineConfig, PipelineError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_path()?,
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file; using defaults");
        return Ok(PipelineConfig::default());
    }
    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<PipelineConfig, PipelineError> {
    let text = std::fs::read_to_string(path).map_err(|err| PipelineError::Config {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;
    let config: PipelineConfig = toml::from_str(&text).map_err(|err| PipelineError::Config {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;
    config.batched_load_options().map_err(|err| PipelineError::Config {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })?;
    Ok(config)
}

/// Write `config` as pretty TOML, creating parent directories.
pub fn save_to_path(config: &PipelineConfig, path: &Path) -> Result<(), PipelineError> {
    let to_config_error = |detail: String| PipelineError::Config {
        path: path.to_path_buf(),
        detail,
    };
    let text = toml::to_string_pretty(config).map_err(|err| to_config_error(err.to_string()))?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| to_config_error(err.to_string()))?;
    }
    std::fs::write(path, text).map_err(|err| to_config_error(err.to_string()))
}

fn default_dataset_id() -> String {
    "sst".to_string()
}

fn default_config_name() -> String {
    "default".to_string()
}

fn default_text_field() -> String {
    "sentence".to_string()
}

fn default_score_field() -> String {
    "label".to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}

fn default_max_attempts() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_holdout_fraction() -> f64 {
    DEFAULT_HOLDOUT_FRACTION
}

fn default_subset() -> SubsetSetting {
    SubsetSetting::Training
}

fn default_export_root() -> PathBuf {
    PathBuf::from("./exports")
}
