//! Weighted averaging of voice style embeddings.
//!
//! A merged voice is the elementwise weighted sum of its inputs. Weights are
//! validated up front so that a bad invocation fails before anything is
//! loaded or written.

use thiserror::Error;

/// Maximum allowed deviation of the weight sum from 1.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    #[error("At least one voice is required")]
    NoVoices,

    #[error("Number of weights ({weights}) must match number of voices ({voices})")]
    WeightCountMismatch { voices: usize, weights: usize },

    #[error("Weights must sum to 1, got {0}")]
    WeightsDoNotSumToOne(f64),

    #[error("Voice {index} has {found} values, expected {expected}")]
    ShapeMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },
}

/// Check a weight list against the number of voices being merged.
///
/// `None` means an unweighted mean and is always valid for a non-empty set.
pub fn validate_weights(voice_count: usize, weights: Option<&[f32]>) -> Result<(), MergeError> {
    if voice_count == 0 {
        return Err(MergeError::NoVoices);
    }

    let Some(weights) = weights else {
        return Ok(());
    };

    if weights.len() != voice_count {
        return Err(MergeError::WeightCountMismatch {
            voices: voice_count,
            weights: weights.len(),
        });
    }

    let sum: f64 = weights.iter().copied().map(f64::from).sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(MergeError::WeightsDoNotSumToOne(sum));
    }

    Ok(())
}

/// Merge embeddings of identical length.
///
/// With weights, returns `Σ wᵢ·vᵢ`; without, the elementwise mean.
#[allow(clippy::cast_precision_loss)]
pub fn merge_embeddings(
    embeddings: &[Vec<f32>],
    weights: Option<&[f32]>,
) -> Result<Vec<f32>, MergeError> {
    validate_weights(embeddings.len(), weights)?;

    let expected = embeddings[0].len();
    if let Some((index, found)) = embeddings
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|&(_, len)| len != expected)
    {
        return Err(MergeError::ShapeMismatch {
            index,
            expected,
            found,
        });
    }

    let mut merged = vec![0.0_f32; expected];
    for (i, embedding) in embeddings.iter().enumerate() {
        let weight = weights.map_or(1.0, |w| w[i]);
        for (out, value) in merged.iter_mut().zip(embedding) {
            *out += weight * value;
        }
    }
    if weights.is_none() {
        let count = embeddings.len() as f32;
        for value in &mut merged {
            *value /= count;
        }
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{a} != {e}");
        }
    }

    #[test]
    fn test_weighted_merge() {
        let v1 = vec![1.0, 2.0, -4.0];
        let v2 = vec![3.0, 0.0, 10.0];
        let merged = merge_embeddings(&[v1.clone(), v2.clone()], Some(&[0.3, 0.7])).unwrap();

        let expected: Vec<f32> = v1
            .iter()
            .zip(&v2)
            .map(|(a, b)| 0.3 * a + 0.7 * b)
            .collect();
        assert_close(&merged, &expected);
    }

    #[test]
    fn test_unweighted_merge_is_mean() {
        let merged =
            merge_embeddings(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 9.0]], None).unwrap();
        assert_close(&merged, &[3.0, 5.0]);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let err = validate_weights(2, Some(&[0.5, 0.6])).unwrap_err();
        assert!(matches!(err, MergeError::WeightsDoNotSumToOne(_)));
    }

    #[test]
    fn test_weight_count_must_match() {
        assert_eq!(
            validate_weights(3, Some(&[0.5, 0.5])),
            Err(MergeError::WeightCountMismatch {
                voices: 3,
                weights: 2
            })
        );
    }

    #[test]
    fn test_no_voices() {
        assert_eq!(merge_embeddings(&[], None), Err(MergeError::NoVoices));
    }

    #[test]
    fn test_shape_mismatch() {
        let err = merge_embeddings(&[vec![1.0, 2.0], vec![1.0]], None).unwrap_err();
        assert_eq!(
            err,
            MergeError::ShapeMismatch {
                index: 1,
                expected: 2,
                found: 1
            }
        );
    }
}
