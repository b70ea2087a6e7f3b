//! Dataset preparation: providers, validated splits, holdout and batching.

pub mod batch;
pub mod cache;
pub mod corpus;
pub mod holdout;
pub mod loader;
pub mod provider;

pub use batch::{Batch, BatchConfig, BatchField, BatchedDataset, Batches, FieldValues};
pub use cache::CachedProvider;
pub use corpus::{CorpusId, Example, RowSchema, Split, SplitCorpus};
pub use holdout::{Holdout, Subset};
pub use loader::{BatchedLoadOptions, FlatSplits, load_batched, load_flat, load_splits};
pub use provider::{CorpusProvider, HfDatasetsServer, JsonlDirProvider, RawRow};
