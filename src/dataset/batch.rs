//! Batch assembly: seeded shuffle, optional holdout, fixed-size batches.

use serde::Serialize;

use super::holdout::{Holdout, Subset, shuffled_indices};
use crate::error::PipelineError;

/// Default number of examples per batch.
pub const DEFAULT_BATCH_SIZE: usize = 32;
/// Default shuffle seed.
pub const DEFAULT_SEED: u64 = 42;
/// Default fraction of examples held out by the re-split.
pub const DEFAULT_HOLDOUT_FRACTION: f64 = 0.2;

/// How a pool of examples is turned into batches.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    pub batch_size: usize,
    /// `None` keeps the input order.
    pub shuffle_seed: Option<u64>,
    /// `None` batches the whole pool.
    pub holdout: Option<Holdout>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            shuffle_seed: Some(DEFAULT_SEED),
            holdout: Some(Holdout {
                fraction: DEFAULT_HOLDOUT_FRACTION,
                subset: Subset::Training,
            }),
        }
    }
}

impl BatchConfig {
    /// Unshuffled, un-split batching of the whole pool.
    pub fn sequential(batch_size: usize) -> Self {
        Self {
            batch_size,
            shuffle_seed: None,
            holdout: None,
        }
    }

    /// Keep `subset` of the holdout re-split, adding a re-split at
    /// [`DEFAULT_HOLDOUT_FRACTION`] when the config has none.
    pub fn with_subset(mut self, subset: Subset) -> Self {
        let fraction = self
            .holdout
            .map_or(DEFAULT_HOLDOUT_FRACTION, |holdout| holdout.fraction);
        self.holdout = Some(Holdout { fraction, subset });
        self
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.batch_size == 0 {
            return Err(PipelineError::InvalidInput(
                "batch size must be at least 1".to_string(),
            ));
        }
        if let Some(holdout) = self.holdout {
            Holdout::new(holdout.fraction, holdout.subset)?;
        }
        Ok(())
    }
}

/// Named columns of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchField {
    Text,
    Classifier,
    Regression,
}

impl BatchField {
    pub const ALL: [BatchField; 3] = [
        BatchField::Text,
        BatchField::Classifier,
        BatchField::Regression,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BatchField::Text => "text",
            BatchField::Classifier => "classifier",
            BatchField::Regression => "regression",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

/// Borrowed view of one batch column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValues<'a> {
    Text(&'a [String]),
    Classifier(&'a [u8]),
    Regression(&'a [f32]),
}

impl FieldValues<'_> {
    pub fn len(&self) -> usize {
        match self {
            FieldValues::Text(values) => values.len(),
            FieldValues::Classifier(values) => values.len(),
            FieldValues::Regression(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Up to `batch_size` examples, column-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Batch {
    pub text: Vec<String>,
    pub classifier: Vec<u8>,
    pub regression: Vec<f32>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn field(&self, field: BatchField) -> FieldValues<'_> {
        match field {
            BatchField::Text => FieldValues::Text(&self.text),
            BatchField::Classifier => FieldValues::Classifier(&self.classifier),
            BatchField::Regression => FieldValues::Regression(&self.regression),
        }
    }

    /// Look a column up by its name (`text`, `classifier`, `regression`).
    pub fn field_by_name(&self, name: &str) -> Option<FieldValues<'_>> {
        BatchField::from_name(name).map(|field| self.field(field))
    }
}

/// Finite, restartable sequence of batches over a selected, ordered pool.
///
/// The ordering and subset selection are fixed at assembly time, so every
/// call to [`BatchedDataset::iter`] yields the same batches.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchedDataset {
    texts: Vec<String>,
    labels: Vec<u8>,
    scores: Vec<f32>,
    batch_size: usize,
}

impl BatchedDataset {
    /// Build batches from parallel columns of equal length.
    pub fn assemble(
        texts: Vec<String>,
        labels: Vec<u8>,
        scores: Vec<f32>,
        config: &BatchConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        if texts.len() != labels.len() || texts.len() != scores.len() {
            return Err(PipelineError::InvalidInput(format!(
                "column lengths differ: {} texts, {} labels, {} scores",
                texts.len(),
                labels.len(),
                scores.len()
            )));
        }
        let total = texts.len();
        let mut order = shuffled_indices(total, config.shuffle_seed);
        if let Some(holdout) = config.holdout {
            order = holdout.select(order);
        }

        let mut slots: Vec<Option<String>> = texts.into_iter().map(Some).collect();
        let mut selected_texts = Vec::with_capacity(order.len());
        let mut selected_labels = Vec::with_capacity(order.len());
        let mut selected_scores = Vec::with_capacity(order.len());
        for &idx in &order {
            if let Some(text) = slots[idx].take() {
                selected_texts.push(text);
                selected_labels.push(labels[idx]);
                selected_scores.push(scores[idx]);
            }
        }

        tracing::debug!(
            total,
            selected = selected_texts.len(),
            batch_size = config.batch_size,
            seed = ?config.shuffle_seed,
            subset = config.holdout.map(|h| h.subset.as_str()),
            "Assembled batched dataset"
        );

        Ok(Self {
            texts: selected_texts,
            labels: selected_labels,
            scores: selected_scores,
            batch_size: config.batch_size,
        })
    }

    /// Number of examples across all batches.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_batches(&self) -> usize {
        self.len().div_ceil(self.batch_size)
    }

    pub fn iter(&self) -> Batches<'_> {
        Batches {
            dataset: self,
            start: 0,
        }
    }
}

impl<'a> IntoIterator for &'a BatchedDataset {
    type Item = Batch;
    type IntoIter = Batches<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the batches of a [`BatchedDataset`].
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    dataset: &'a BatchedDataset,
    start: usize,
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        let total = self.dataset.len();
        if self.start >= total {
            return None;
        }
        let end = (self.start + self.dataset.batch_size).min(total);
        let range = self.start..end;
        self.start = end;
        Some(Batch {
            text: self.dataset.texts[range.clone()].to_vec(),
            classifier: self.dataset.labels[range.clone()].to_vec(),
            regression: self.dataset.scores[range].to_vec(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .dataset
            .len()
            .saturating_sub(self.start)
            .div_ceil(self.dataset.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}
