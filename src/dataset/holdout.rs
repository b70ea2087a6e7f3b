//! Seeded ordering and the train/holdout re-split applied before batching.

use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Which side of the holdout re-split a batched dataset materialises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subset {
    /// The leading `1 - fraction` of the shuffled order.
    Training,
    /// The trailing `fraction` of the shuffled order.
    Validation,
}

impl Subset {
    pub fn as_str(self) -> &'static str {
        match self {
            Subset::Training => "training",
            Subset::Validation => "validation",
        }
    }
}

/// Fraction of examples held out, and which side to keep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Holdout {
    pub fraction: f64,
    pub subset: Subset,
}

impl Holdout {
    pub fn new(fraction: f64, subset: Subset) -> Result<Self, PipelineError> {
        if !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
            return Err(PipelineError::InvalidInput(format!(
                "holdout fraction must be in [0, 1), got {fraction}"
            )));
        }
        Ok(Self { fraction, subset })
    }

    /// Number of examples that fall on the validation side.
    pub fn holdout_len(&self, total: usize) -> usize {
        ((total as f64) * self.fraction).floor() as usize
    }

    /// Keep the part of an already shuffled order that belongs to `subset`.
    pub fn select(&self, mut order: Vec<usize>) -> Vec<usize> {
        let split_at = order.len() - self.holdout_len(order.len()).min(order.len());
        match self.subset {
            Subset::Training => {
                order.truncate(split_at);
                order
            }
            Subset::Validation => order.split_off(split_at),
        }
    }
}

/// Indices `0..len`, shuffled by `seed` when one is given.
pub fn shuffled_indices(len: usize, seed: Option<u64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseeded_order_is_identity() {
        assert_eq!(shuffled_indices(4, None), vec![0, 1, 2, 3]);
    }

    #[test]
    fn seeded_order_is_reproducible_permutation() {
        let first = shuffled_indices(50, Some(42));
        let second = shuffled_indices(50, Some(42));
        assert_eq!(first, second);
        let mut sorted = first.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(first, shuffled_indices(50, Some(7)));
    }

    #[test]
    fn subsets_partition_the_order() {
        let order = shuffled_indices(10, Some(42));
        let training = Holdout::new(0.2, Subset::Training).unwrap().select(order.clone());
        let validation = Holdout::new(0.2, Subset::Validation).unwrap().select(order.clone());
        assert_eq!(training.len(), 8);
        assert_eq!(validation.len(), 2);
        let mut joined = training.clone();
        joined.extend(&validation);
        assert_eq!(joined, order);
    }

    #[test]
    fn holdout_len_floors() {
        let holdout = Holdout::new(0.2, Subset::Training).unwrap();
        assert_eq!(holdout.holdout_len(9), 1);
        assert_eq!(holdout.holdout_len(4), 0);
        assert_eq!(holdout.holdout_len(0), 0);
    }

    #[test]
    fn zero_fraction_keeps_everything_for_training() {
        let holdout = Holdout::new(0.0, Subset::Training).unwrap();
        assert_eq!(holdout.select(vec![3, 1, 2]), vec![3, 1, 2]);
        let holdout = Holdout::new(0.0, Subset::Validation).unwrap();
        assert!(holdout.select(vec![3, 1, 2]).is_empty());
    }

    #[test]
    fn rejects_fraction_out_of_range() {
        assert!(Holdout::new(1.0, Subset::Training).is_err());
        assert!(Holdout::new(-0.1, Subset::Training).is_err());
        assert!(Holdout::new(f64::NAN, Subset::Validation).is_err());
    }
}
