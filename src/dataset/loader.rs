//! Loads the corpus splits and shapes them for a trainer.
//!
//! Two shapes are offered: flat parallel columns (training on one side,
//! validation+test concatenated on the other) and batched datasets built
//! from the same two pools.

use super::batch::{BatchConfig, BatchedDataset};
use super::corpus::{CorpusId, Example, Split, SplitCorpus, columns};
use super::holdout::Subset;
use super::provider::CorpusProvider;
use crate::error::PipelineError;
use crate::labels::binarize;

/// Flat training and evaluation columns.
///
/// `y1_*` are the continuous scores, `y2_*` the binarized labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatSplits {
    pub text_train: Vec<String>,
    pub y1_train: Vec<f32>,
    pub y2_train: Vec<u8>,
    pub text_test: Vec<String>,
    pub y1_test: Vec<f32>,
    pub y2_test: Vec<u8>,
}

/// Batching settings for each pool, set independently.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchedLoadOptions {
    pub train: BatchConfig,
    pub eval: BatchConfig,
}

/// Fetch and validate every split of `corpus`.
pub fn load_splits<P: CorpusProvider + ?Sized>(
    provider: &P,
    corpus: &CorpusId,
) -> Result<SplitCorpus, PipelineError> {
    let mut loaded = SplitCorpus::default();
    for split in Split::ALL {
        let examples = provider.fetch_split(corpus, split)?;
        tracing::debug!(corpus = %corpus, split = %split, rows = examples.len(), "Loaded split");
        loaded.set(split, examples);
    }
    tracing::info!(
        corpus = %corpus,
        train = loaded.train.len(),
        validation = loaded.validation.len(),
        test = loaded.test.len(),
        "Corpus loaded"
    );
    Ok(loaded)
}

/// Load the corpus and return flat columns.
pub fn load_flat<P: CorpusProvider + ?Sized>(
    provider: &P,
    corpus: &CorpusId,
) -> Result<FlatSplits, PipelineError> {
    load_splits(provider, corpus)?.flatten()
}

/// Load the corpus and return `(train, eval)` batched datasets.
pub fn load_batched<P: CorpusProvider + ?Sized>(
    provider: &P,
    corpus: &CorpusId,
    options: &BatchedLoadOptions,
) -> Result<(BatchedDataset, BatchedDataset), PipelineError> {
    load_splits(provider, corpus)?.batched(options)
}

impl SplitCorpus {
    pub fn flatten(&self) -> Result<FlatSplits, PipelineError> {
        let (text_train, y1_train) = columns(&self.train);
        let y2_train = binarize(&y1_train)?;
        let (text_test, y1_test) = columns(&self.eval_pool());
        let y2_test = binarize(&y1_test)?;
        Ok(FlatSplits {
            text_train,
            y1_train,
            y2_train,
            text_test,
            y1_test,
            y2_test,
        })
    }

    pub fn batched(
        &self,
        options: &BatchedLoadOptions,
    ) -> Result<(BatchedDataset, BatchedDataset), PipelineError> {
        if options
            .eval
            .holdout
            .is_some_and(|holdout| holdout.subset == Subset::Training)
        {
            tracing::warn!(
                "Evaluation pool is batched with the `training` holdout subset; \
                 part of validation+test will be dropped"
            );
        }
        let train = assemble_pool(&self.train, &options.train)?;
        let eval = assemble_pool(&self.eval_pool(), &options.eval)?;
        Ok((train, eval))
    }
}

fn assemble_pool(
    examples: &[Example],
    config: &BatchConfig,
) -> Result<BatchedDataset, PipelineError> {
    let (texts, scores) = columns(examples);
    let labels = binarize(&scores)?;
    BatchedDataset::assemble(texts, labels, scores, config)
}
