//! Binary labels derived from continuous sentiment scores.

use crate::error::PipelineError;

/// Scores strictly above this value map to the positive class.
pub const POSITIVE_THRESHOLD: f32 = 0.5;

/// Map one score to `{0, 1}`; exactly `0.5` stays negative.
pub fn binarize_score(score: f32) -> u8 {
    u8::from(score > POSITIVE_THRESHOLD)
}

/// Binarize a sequence of scores, rejecting non-finite or out-of-range values.
pub fn binarize(scores: &[f32]) -> Result<Vec<u8>, PipelineError> {
    scores
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(PipelineError::InvalidScore { index, value });
            }
            Ok(binarize_score(value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strict() {
        assert_eq!(binarize_score(0.5), 0);
        assert_eq!(binarize_score(0.500_001), 1);
        assert_eq!(binarize_score(1.0), 1);
        assert_eq!(binarize_score(0.0), 0);
    }

    #[test]
    fn binarizes_mixed_scores() {
        let labels = binarize(&[0.1, 0.6, 0.5, 0.9]).unwrap();
        assert_eq!(labels, vec![0, 1, 0, 1]);
    }

    #[test]
    fn output_matches_input_length() {
        let scores: Vec<f32> = (0..=100).map(|i| i as f32 / 100.0).collect();
        let labels = binarize(&scores).unwrap();
        assert_eq!(labels.len(), scores.len());
        assert!(labels.iter().all(|&label| label <= 1));
        assert_eq!(labels.iter().filter(|&&label| label == 1).count(), 50);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(binarize(&[]).unwrap().is_empty());
    }

    #[test]
    fn rejects_nan_and_out_of_range() {
        let err = binarize(&[0.2, f32::NAN]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidScore { index: 1, .. }));
        let err = binarize(&[1.5]).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidScore { index: 0, .. }));
        assert!(binarize(&[-0.01]).is_err());
        assert!(binarize(&[f32::INFINITY]).is_err());
    }
}
