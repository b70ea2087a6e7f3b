//! On-disk cache of fetched splits so repeated runs skip the network.
//!
//! Entries hold the provider's raw rows; the wrapped provider's schema is
//! applied on every read, so changing field names never serves stale data.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::corpus::{CorpusId, RowSchema, Split};
use super::provider::{CorpusProvider, RawRow, read_jsonl_rows};
use crate::app_dirs;
use crate::error::PipelineError;

/// Wraps a provider, storing each split as
/// `<root>/<source>/<dataset>/<config>/<split>.jsonl`.
#[derive(Debug, Clone)]
pub struct CachedProvider<P> {
    inner: P,
    root: PathBuf,
}

impl<P: CorpusProvider> CachedProvider<P> {
    pub fn new(inner: P, root: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            root: root.into(),
        }
    }

    /// Cache under the application's `cache/datasets` directory.
    pub fn in_app_cache(inner: P) -> Result<Self, PipelineError> {
        let root = app_dirs::cache_dir()
            .map_err(|err| PipelineError::Config {
                path: PathBuf::from(app_dirs::APP_DIR_NAME).join("cache"),
                detail: err.to_string(),
            })?
            .join("datasets");
        Ok(Self::new(inner, root))
    }

    pub fn entry_path(&self, corpus: &CorpusId, split: Split) -> PathBuf {
        self.root
            .join(sanitize_component(&self.inner.source()))
            .join(sanitize_component(&corpus.dataset_id))
            .join(sanitize_component(&corpus.config_name))
            .join(format!("{}.jsonl", split.as_str()))
    }

    fn read_entry(&self, path: &Path, split: Split) -> Result<Vec<RawRow>, PipelineError> {
        let file = File::open(path).map_err(|err| {
            PipelineError::unavailable(path.display().to_string(), split.as_str(), err)
        })?;
        read_jsonl_rows(path, BufReader::new(file), split, |row, value| {
            serde_json::from_value(value).map_err(|err| {
                PipelineError::schema(split.as_str(), row, format!("cache entry: {err}"))
            })
        })
    }

    fn write_entry(&self, path: &Path, rows: &[RawRow]) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("jsonl.partial");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            for row in rows {
                serde_json::to_writer(&mut writer, row)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, path)
    }
}

impl<P: CorpusProvider> CorpusProvider for CachedProvider<P> {
    fn fetch_rows(&self, corpus: &CorpusId, split: Split) -> Result<Vec<RawRow>, PipelineError> {
        let path = self.entry_path(corpus, split);
        if path.is_file() {
            match self.read_entry(&path, split) {
                Ok(rows) => {
                    tracing::debug!(path = %path.display(), "Dataset cache hit");
                    return Ok(rows);
                }
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        "Ignoring unreadable cache entry: {err}"
                    );
                }
            }
        }
        let rows = self.inner.fetch_rows(corpus, split)?;
        if let Err(err) = self.write_entry(&path, &rows) {
            tracing::warn!(path = %path.display(), "Failed to write dataset cache: {err}");
        }
        Ok(rows)
    }

    fn schema(&self) -> &RowSchema {
        self.inner.schema()
    }

    fn source(&self) -> String {
        self.inner.source()
    }
}

fn sanitize_component(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.chars().all(|c| c == '.') {
        "_".repeat(cleaned.len().max(1))
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_dirs::test_support::OverrideGuard;
    use crate::dataset::provider::JsonlDirProvider;
    use serde_json::json;
    use std::cell::Cell;
    use tempfile::tempdir;

    #[derive(Debug)]
    struct CountingProvider {
        calls: Cell<usize>,
        schema: RowSchema,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: Cell::new(0),
                schema: RowSchema::default(),
            }
        }
    }

    impl CorpusProvider for CountingProvider {
        fn fetch_rows(
            &self,
            _corpus: &CorpusId,
            split: Split,
        ) -> Result<Vec<RawRow>, PipelineError> {
            self.calls.set(self.calls.get() + 1);
            Ok(vec![RawRow {
                row_idx: 0,
                row: json!({"sentence": format!("{split} row"), "label": 0.75}),
            }])
        }

        fn schema(&self) -> &RowSchema {
            &self.schema
        }

        fn source(&self) -> String {
            "https://rows.example".to_string()
        }
    }

    #[test]
    fn second_fetch_is_served_from_disk() {
        let dir = tempdir().unwrap();
        let cached = CachedProvider::new(CountingProvider::new(), dir.path());
        let corpus = CorpusId::sst();
        let first = cached.fetch_split(&corpus, Split::Train).unwrap();
        let second = cached.fetch_split(&corpus, Split::Train).unwrap();
        assert_eq!(first, second);
        assert_eq!(cached.inner.calls.get(), 1);
        assert!(
            dir.path()
                .join("https___rows.example/sst/default/train.jsonl")
                .is_file()
        );
    }

    #[test]
    fn splits_are_cached_independently() {
        let dir = tempdir().unwrap();
        let cached = CachedProvider::new(CountingProvider::new(), dir.path());
        let corpus = CorpusId::sst();
        cached.fetch_split(&corpus, Split::Train).unwrap();
        let test = cached.fetch_split(&corpus, Split::Test).unwrap();
        assert_eq!(test[0].text, "test row");
        assert_eq!(cached.inner.calls.get(), 2);
    }

    #[test]
    fn cached_rows_follow_the_current_schema() {
        let source = tempdir().unwrap();
        let cache = tempdir().unwrap();
        std::fs::write(
            source.path().join("train.jsonl"),
            "{\"sentence\":\"full sentence\",\"tokens\":\"full|sentence\",\"label\":0.6}\n",
        )
        .unwrap();
        let corpus = CorpusId::sst();

        let by_sentence = CachedProvider::new(JsonlDirProvider::new(source.path()), cache.path());
        let first = by_sentence.fetch_split(&corpus, Split::Train).unwrap();
        assert_eq!(first[0].text, "full sentence");

        let tokens = RowSchema {
            text_field: "tokens".to_string(),
            ..RowSchema::default()
        };
        let by_tokens = CachedProvider::new(
            JsonlDirProvider::new(source.path()).with_schema(tokens),
            cache.path(),
        );
        std::fs::remove_file(source.path().join("train.jsonl")).unwrap();
        let second = by_tokens.fetch_split(&corpus, Split::Train).unwrap();
        assert_eq!(second[0].text, "full|sentence");
    }

    #[test]
    fn sources_do_not_share_entries() {
        let cache = tempdir().unwrap();
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let corpus = CorpusId::sst();
        let from_a = CachedProvider::new(JsonlDirProvider::new(a.path()), cache.path());
        let from_b = CachedProvider::new(JsonlDirProvider::new(b.path()), cache.path());
        assert_ne!(
            from_a.entry_path(&corpus, Split::Train),
            from_b.entry_path(&corpus, Split::Train)
        );
    }

    #[test]
    fn unreadable_entry_is_refetched() {
        let dir = tempdir().unwrap();
        let cached = CachedProvider::new(CountingProvider::new(), dir.path());
        let corpus = CorpusId::sst();
        let path = cached.entry_path(&corpus, Split::Validation);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{truncated\n").unwrap();

        let examples = cached.fetch_split(&corpus, Split::Validation).unwrap();
        assert_eq!(examples[0].text, "validation row");
        assert_eq!(cached.inner.calls.get(), 1);

        cached.fetch_split(&corpus, Split::Validation).unwrap();
        assert_eq!(cached.inner.calls.get(), 1);
    }

    #[test]
    fn unresolvable_cache_dir_is_config_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let _guard = OverrideGuard::set(blocker);
        let err = CachedProvider::in_app_cache(CountingProvider::new()).unwrap_err();
        assert!(matches!(err, PipelineError::Config { .. }));
    }

    #[test]
    fn path_components_stay_inside_root() {
        let dir = tempdir().unwrap();
        let cached = CachedProvider::new(CountingProvider::new(), dir.path());
        let path = cached.entry_path(
            &CorpusId::new("stanfordnlp/sst", "default"),
            Split::Validation,
        );
        assert_eq!(
            path,
            dir.path()
                .join("https___rows.example")
                .join("stanfordnlp_sst")
                .join("default")
                .join("validation.jsonl")
        );
        let path = cached.entry_path(&CorpusId::new("..", ""), Split::Train);
        assert!(path.starts_with(dir.path().join("https___rows.example").join("__")));
    }
}
