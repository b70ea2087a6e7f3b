//! Timestamped export directories for trained models.
//!
//! Directory names look like `2024-03-05-14-07-09-hf-ts-3epochs-bert_base`.
//! The zero-padded timestamp prefix keeps exports sorted by creation time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use crate::error::PipelineError;

/// Timestamp layout used as the directory prefix.
pub const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]-[hour]-[minute]-[second]");
/// Metadata file written next to every export.
pub const EXPORT_METADATA_FILE: &str = "export.json";
const INVALID_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// A trained model that knows how to write itself into a directory.
pub trait ExportModel {
    fn write_to(&self, dir: &Path) -> io::Result<()>;
}

/// Exports any serializable model as pretty `model.json`.
#[derive(Debug, Clone)]
pub struct JsonModel<T>(pub T);

impl<T: Serialize> ExportModel for JsonModel<T> {
    fn write_to(&self, dir: &Path) -> io::Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.0)?;
        fs::write(dir.join("model.json"), bytes)
    }
}

#[derive(Debug, Serialize)]
struct ExportMetadata<'a> {
    model_name: &'a str,
    epochs: usize,
    created_at: String,
}

/// Replace characters that are not valid inside a single path component.
pub fn sanitize_model_name(model_name: &str) -> String {
    let cleaned: String = model_name
        .trim()
        .chars()
        .map(|c| {
            if INVALID_NAME_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "model".to_string()
    } else {
        cleaned
    }
}

/// Build `<timestamp>-hf-ts-<epochs>epochs-<sanitized name>`.
pub fn export_dir_name(
    now: OffsetDateTime,
    epochs: usize,
    model_name: &str,
) -> Result<String, PipelineError> {
    let stamp = now
        .format(TIMESTAMP_FORMAT)
        .map_err(|err| PipelineError::InvalidInput(format!("export timestamp: {err}")))?;
    Ok(format!(
        "{stamp}-hf-ts-{epochs}epochs-{}",
        sanitize_model_name(model_name)
    ))
}

/// Create a fresh export directory under `root` and write `model` into it.
///
/// Fails with [`PipelineError::Persistence`] when the directory already
/// exists or cannot be written.
pub fn save_model(
    model: &impl ExportModel,
    root: &Path,
    epochs: usize,
    model_name: &str,
    now: OffsetDateTime,
) -> Result<PathBuf, PipelineError> {
    let dir = root.join(export_dir_name(now, epochs, model_name)?);
    let persistence = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| PipelineError::Persistence { path, source }
    };
    fs::create_dir_all(root).map_err(persistence(root))?;
    fs::create_dir(&dir).map_err(persistence(dir.as_path()))?;
    model.write_to(&dir).map_err(persistence(dir.as_path()))?;

    let created_at = now
        .format(&Rfc3339)
        .map_err(|err| PipelineError::InvalidInput(format!("export timestamp: {err}")))?;
    let metadata = ExportMetadata {
        model_name,
        epochs,
        created_at,
    };
    let metadata_path = dir.join(EXPORT_METADATA_FILE);
    let bytes = serde_json::to_vec_pretty(&metadata).map_err(|err| PipelineError::Persistence {
        path: metadata_path.clone(),
        source: err.into(),
    })?;
    fs::write(&metadata_path, bytes).map_err(persistence(metadata_path.as_path()))?;

    tracing::info!(path = %dir.display(), epochs, "Exported model");
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;
    use time::PrimitiveDateTime;
    use time::macros::datetime;

    #[test]
    fn dir_name_has_epochs_and_sanitized_name() {
        let now = datetime!(2024-03-05 14:07:09 UTC);
        let name = export_dir_name(now, 3, "bert/base").unwrap();
        assert_eq!(name, "2024-03-05-14-07-09-hf-ts-3epochs-bert_base");
        assert!(name.contains("3epochs"));
        assert!(name.contains("bert_base"));
        assert!(!name.contains('/'));
        PrimitiveDateTime::parse(&name[..19], TIMESTAMP_FORMAT).unwrap();
    }

    #[test]
    fn names_sort_by_creation_time() {
        let earlier = export_dir_name(datetime!(2024-01-09 23:59:59 UTC), 10, "m").unwrap();
        let later = export_dir_name(datetime!(2024-01-10 00:00:00 UTC), 2, "m").unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn sanitizes_windows_separators_and_empty_names() {
        assert_eq!(sanitize_model_name(r"org\model:v1"), "org_model_v1");
        assert_eq!(sanitize_model_name("  "), "model");
        assert_eq!(sanitize_model_name(".."), "model");
        assert_eq!(
            sanitize_model_name("distilbert-base-uncased"),
            "distilbert-base-uncased"
        );
    }

    #[test]
    fn saves_model_and_metadata() {
        let root = tempdir().unwrap();
        let now = datetime!(2024-03-05 14:07:09 UTC);
        let model = JsonModel(json!({"weights": [0.5, -0.25]}));
        let dir = save_model(&model, &root.path().join("exports"), 3, "bert/base", now).unwrap();

        assert_eq!(
            dir.file_name().unwrap().to_str().unwrap(),
            "2024-03-05-14-07-09-hf-ts-3epochs-bert_base"
        );
        let saved: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.join("model.json")).unwrap()).unwrap();
        assert_eq!(saved["weights"][1], -0.25);
        let meta: serde_json::Value =
            serde_json::from_slice(&fs::read(dir.join(EXPORT_METADATA_FILE)).unwrap()).unwrap();
        assert_eq!(meta["model_name"], "bert/base");
        assert_eq!(meta["epochs"], 3);
        assert_eq!(meta["created_at"], "2024-03-05T14:07:09Z");
    }

    #[test]
    fn refuses_to_overwrite_existing_export() {
        let root = tempdir().unwrap();
        let now = datetime!(2024-03-05 14:07:09 UTC);
        let model = JsonModel(json!({}));
        save_model(&model, root.path(), 1, "m", now).unwrap();
        let err = save_model(&model, root.path(), 1, "m", now).unwrap_err();
        assert!(matches!(err, PipelineError::Persistence { .. }));
    }

    #[test]
    fn write_failure_is_persistence_error() {
        struct Broken;
        impl ExportModel for Broken {
            fn write_to(&self, _dir: &Path) -> io::Result<()> {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
            }
        }
        let root = tempdir().unwrap();
        let err = save_model(&Broken, root.path(), 1, "m", OffsetDateTime::UNIX_EPOCH).unwrap_err();
        assert!(matches!(err, PipelineError::Persistence { .. }));
    }
}
