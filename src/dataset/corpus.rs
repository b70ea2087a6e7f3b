//! Typed corpus records and split identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PipelineError;

/// Identifies a corpus on a provider (`dataset_id`, `config_name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorpusId {
    pub dataset_id: String,
    pub config_name: String,
}

impl CorpusId {
    pub fn new(dataset_id: impl Into<String>, config_name: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            config_name: config_name.into(),
        }
    }

    /// The Stanford Sentiment Treebank with its default configuration.
    pub fn sst() -> Self {
        Self::new("sst", "default")
    }
}

impl fmt::Display for CorpusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dataset_id, self.config_name)
    }
}

/// Provider-defined partition of a corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Validation, Split::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labelled sentence with its continuous sentiment score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub text: String,
    pub score: f32,
}

/// Field names used to pull an [`Example`] out of an untyped provider row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSchema {
    pub text_field: String,
    pub score_field: String,
}

impl Default for RowSchema {
    fn default() -> Self {
        Self {
            text_field: "sentence".to_string(),
            score_field: "label".to_string(),
        }
    }
}

impl RowSchema {
    /// Validate a raw JSON row, rejecting missing or mistyped fields.
    pub fn parse_row(
        &self,
        split: Split,
        row: usize,
        value: &Value,
    ) -> Result<Example, PipelineError> {
        let object = value
            .as_object()
            .ok_or_else(|| PipelineError::schema(split.as_str(), row, "row is not an object"))?;
        let text = match object.get(&self.text_field) {
            Some(Value::String(text)) => text.clone(),
            Some(_) => {
                return Err(PipelineError::schema(
                    split.as_str(),
                    row,
                    format!("field `{}` is not a string", self.text_field),
                ));
            }
            None => {
                return Err(PipelineError::schema(
                    split.as_str(),
                    row,
                    format!("missing field `{}`", self.text_field),
                ));
            }
        };
        let score = match object.get(&self.score_field) {
            Some(Value::Number(number)) => number.as_f64().ok_or_else(|| {
                PipelineError::schema(
                    split.as_str(),
                    row,
                    format!("field `{}` is not representable as f64", self.score_field),
                )
            })? as f32,
            Some(_) => {
                return Err(PipelineError::schema(
                    split.as_str(),
                    row,
                    format!("field `{}` is not a number", self.score_field),
                ));
            }
            None => {
                return Err(PipelineError::schema(
                    split.as_str(),
                    row,
                    format!("missing field `{}`", self.score_field),
                ));
            }
        };
        Ok(Example { text, score })
    }
}

/// All three provider splits, loaded and validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitCorpus {
    pub train: Vec<Example>,
    pub validation: Vec<Example>,
    pub test: Vec<Example>,
}

impl SplitCorpus {
    pub fn get(&self, split: Split) -> &[Example] {
        match split {
            Split::Train => &self.train,
            Split::Validation => &self.validation,
            Split::Test => &self.test,
        }
    }

    pub(crate) fn set(&mut self, split: Split, examples: Vec<Example>) {
        match split {
            Split::Train => self.train = examples,
            Split::Validation => self.validation = examples,
            Split::Test => self.test = examples,
        }
    }

    /// Validation followed by test, the pool used for evaluation.
    pub fn eval_pool(&self) -> Vec<Example> {
        self.validation
            .iter()
            .chain(self.test.iter())
            .cloned()
            .collect()
    }
}

/// Unzip examples into parallel text and score columns.
pub fn columns(examples: &[Example]) -> (Vec<String>, Vec<f32>) {
    examples
        .iter()
        .map(|example| (example.text.clone(), example.score))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_well_formed_row() {
        let schema = RowSchema::default();
        let row = json!({
            "sentence": "a gripping film",
            "label": 0.875,
            "tokens": "a|gripping|film"
        });
        let example = schema.parse_row(Split::Train, 0, &row).unwrap();
        assert_eq!(example.text, "a gripping film");
        assert!((example.score - 0.875).abs() < 1e-6);
    }

    #[test]
    fn missing_label_is_schema_mismatch() {
        let schema = RowSchema::default();
        let row = json!({"sentence": "no score here"});
        let err = schema.parse_row(Split::Test, 7, &row).unwrap_err();
        match err {
            PipelineError::SchemaMismatch { split, row, detail } => {
                assert_eq!(split, "test");
                assert_eq!(row, 7);
                assert!(detail.contains("label"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn string_score_is_schema_mismatch() {
        let schema = RowSchema::default();
        let row = json!({"sentence": "x", "label": "0.4"});
        assert!(matches!(
            schema.parse_row(Split::Train, 0, &row),
            Err(PipelineError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn custom_field_names() {
        let schema = RowSchema {
            text_field: "text".to_string(),
            score_field: "score".to_string(),
        };
        let row = json!({"text": "ok", "score": 1});
        let example = schema.parse_row(Split::Validation, 0, &row).unwrap();
        assert_eq!(example.score, 1.0);
    }

    #[test]
    fn eval_pool_keeps_validation_before_test() {
        let corpus = SplitCorpus {
            train: vec![],
            validation: vec![Example {
                text: "v".into(),
                score: 0.1,
            }],
            test: vec![Example {
                text: "t".into(),
                score: 0.9,
            }],
        };
        let pool = corpus.eval_pool();
        let (texts, scores) = columns(&pool);
        assert_eq!(texts, vec!["v", "t"]);
        assert_eq!(scores, vec![0.1, 0.9]);
    }
}
