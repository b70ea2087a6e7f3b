//! Corpus providers: the Hugging Face datasets-server and local JSONL folders.
//!
//! Providers hand out raw rows; [`CorpusProvider::fetch_split`] maps them
//! through the provider's [`RowSchema`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use super::corpus::{CorpusId, Example, RowSchema, Split};
use crate::error::PipelineError;
use crate::http_client::{self, FetchError, RetryConfig};

/// Public endpoint of the Hugging Face datasets-server.
pub const DEFAULT_ENDPOINT: &str = "https://datasets-server.huggingface.co";
/// Largest page the datasets-server accepts for `/rows`.
pub const MAX_PAGE_SIZE: usize = 100;
const MAX_PAGE_BYTES: usize = 16 * 1024 * 1024;

/// One untyped row as the provider returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub row_idx: usize,
    pub row: serde_json::Value,
}

/// Source of rows for one split of a corpus.
pub trait CorpusProvider {
    /// Rows of `split` in provider order, before any field mapping.
    fn fetch_rows(&self, corpus: &CorpusId, split: Split) -> Result<Vec<RawRow>, PipelineError>;

    /// Field names used to turn raw rows into examples.
    fn schema(&self) -> &RowSchema;

    /// Where rows come from (endpoint or directory); keys on-disk caches.
    fn source(&self) -> String;

    /// Fetch `split` and validate every row against [`CorpusProvider::schema`].
    fn fetch_split(&self, corpus: &CorpusId, split: Split) -> Result<Vec<Example>, PipelineError> {
        let schema = self.schema();
        self.fetch_rows(corpus, split)?
            .iter()
            .map(|raw| schema.parse_row(split, raw.row_idx, &raw.row))
            .collect()
    }
}

impl<P: CorpusProvider + ?Sized> CorpusProvider for &P {
    fn fetch_rows(&self, corpus: &CorpusId, split: Split) -> Result<Vec<RawRow>, PipelineError> {
        (**self).fetch_rows(corpus, split)
    }

    fn schema(&self) -> &RowSchema {
        (**self).schema()
    }

    fn source(&self) -> String {
        (**self).source()
    }
}

impl<P: CorpusProvider + ?Sized> CorpusProvider for Box<P> {
    fn fetch_rows(&self, corpus: &CorpusId, split: Split) -> Result<Vec<RawRow>, PipelineError> {
        (**self).fetch_rows(corpus, split)
    }

    fn schema(&self) -> &RowSchema {
        (**self).schema()
    }

    fn source(&self) -> String {
        (**self).source()
    }
}

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RawRow>,
    num_rows_total: usize,
}

/// Pages through `/rows` on a datasets-server instance.
#[derive(Debug, Clone)]
pub struct HfDatasetsServer {
    endpoint: String,
    page_size: usize,
    retry: RetryConfig,
    schema: RowSchema,
}

impl Default for HfDatasetsServer {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl HfDatasetsServer {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            page_size: MAX_PAGE_SIZE,
            retry: RetryConfig::none(),
            schema: RowSchema::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_schema(mut self, schema: RowSchema) -> Self {
        self.schema = schema;
        self
    }

    fn rows_url(
        &self,
        corpus: &CorpusId,
        split: Split,
        offset: usize,
    ) -> Result<Url, PipelineError> {
        let mut url = Url::parse(&format!("{}/rows", self.endpoint)).map_err(|err| {
            PipelineError::unavailable(
                &corpus.dataset_id,
                split.as_str(),
                format!("bad endpoint: {err}"),
            )
        })?;
        url.query_pairs_mut()
            .append_pair("dataset", &corpus.dataset_id)
            .append_pair("config", &corpus.config_name)
            .append_pair("split", split.as_str())
            .append_pair("offset", &offset.to_string())
            .append_pair("length", &self.page_size.to_string());
        Ok(url)
    }

    fn fetch_page(
        &self,
        corpus: &CorpusId,
        split: Split,
        offset: usize,
    ) -> Result<RowsPage, PipelineError> {
        let url = self.rows_url(corpus, split, offset)?;
        tracing::debug!(%url, "Fetching rows page");
        http_client::retry_with_backoff(
            self.retry,
            || http_client::get_json::<RowsPage>(url.as_str(), MAX_PAGE_BYTES),
            FetchError::is_transient,
        )
        .map_err(|err| match err {
            FetchError::Json(err) => PipelineError::schema(
                split.as_str(),
                offset,
                format!("unexpected page shape: {err}"),
            ),
            other => PipelineError::unavailable(&corpus.dataset_id, split.as_str(), other),
        })
    }
}

impl CorpusProvider for HfDatasetsServer {
    fn fetch_rows(&self, corpus: &CorpusId, split: Split) -> Result<Vec<RawRow>, PipelineError> {
        let mut rows = Vec::new();
        let mut total = None;
        loop {
            let offset = rows.len();
            if total.is_some_and(|total| offset >= total) {
                break;
            }
            let page = self.fetch_page(corpus, split, offset)?;
            total.get_or_insert(page.num_rows_total);
            if page.rows.is_empty() {
                break;
            }
            rows.extend(page.rows);
        }
        tracing::info!(corpus = %corpus, split = %split, rows = rows.len(), "Fetched split");
        Ok(rows)
    }

    fn schema(&self) -> &RowSchema {
        &self.schema
    }

    fn source(&self) -> String {
        self.endpoint.clone()
    }
}

/// Reads `<root>/<split>.jsonl`, one JSON object per line.
#[derive(Debug, Clone)]
pub struct JsonlDirProvider {
    root: PathBuf,
    schema: RowSchema,
}

impl JsonlDirProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            schema: RowSchema::default(),
        }
    }

    pub fn with_schema(mut self, schema: RowSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn split_path(&self, split: Split) -> PathBuf {
        self.root.join(format!("{}.jsonl", split.as_str()))
    }
}

impl CorpusProvider for JsonlDirProvider {
    fn fetch_rows(&self, corpus: &CorpusId, split: Split) -> Result<Vec<RawRow>, PipelineError> {
        let path = self.split_path(split);
        let file = File::open(&path).map_err(|err| {
            PipelineError::unavailable(
                &corpus.dataset_id,
                split.as_str(),
                format!("{}: {err}", path.display()),
            )
        })?;
        read_jsonl_rows(&path, BufReader::new(file), split, |row_idx, row| {
            Ok(RawRow { row_idx, row })
        })
    }

    fn schema(&self) -> &RowSchema {
        &self.schema
    }

    fn source(&self) -> String {
        self.root.display().to_string()
    }
}

/// Parse non-empty JSONL lines, mapping each through `parse`.
pub(crate) fn read_jsonl_rows<R, T, F>(
    path: &Path,
    reader: R,
    split: Split,
    mut parse: F,
) -> Result<Vec<T>, PipelineError>
where
    R: BufRead,
    F: FnMut(usize, serde_json::Value) -> Result<T, PipelineError>,
{
    let mut out = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| {
            PipelineError::unavailable(path.display().to_string(), split.as_str(), err)
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(&line).map_err(|err| {
            PipelineError::schema(split.as_str(), idx, format!("line {}: {err}", idx + 1))
        })?;
        out.push(parse(idx, value)?);
    }
    Ok(out)
}
