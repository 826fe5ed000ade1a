//! Validated classifier output.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Tolerance on the softmax sum invariant.
const PROB_SUM_EPSILON: f32 = 1e-3;

/// A single classification result: the full probability vector and the
/// argmax class index.
///
/// Constructed once per image and passed immutably to every downstream
/// consumer. All three explanation generators receive the *same*
/// `Prediction`, so an explanation can never be computed for a class
/// other than the one being displayed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    class_index: usize,
    probs: Vec<f32>,
}

impl Prediction {
    /// Build a prediction from a softmax probability vector.
    ///
    /// Validates the softmax invariant: non-empty, all values finite and
    /// in `[0, 1]`, sum within epsilon of 1. The class index is the
    /// argmax of the vector.
    pub fn from_probs(probs: Vec<f32>) -> Result<Self> {
        if probs.is_empty() {
            return Err(CoreError::InvalidProbabilities("empty vector".into()));
        }
        if probs.iter().any(|p| !p.is_finite() || *p < 0.0 || *p > 1.0) {
            return Err(CoreError::InvalidProbabilities(
                "values must be finite and in [0, 1]".into(),
            ));
        }
        let sum: f32 = probs.iter().sum();
        if (sum - 1.0).abs() > PROB_SUM_EPSILON {
            return Err(CoreError::InvalidProbabilities(format!(
                "sum is {sum}, expected 1"
            )));
        }

        let class_index = probs
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);

        Ok(Self { class_index, probs })
    }

    /// The predicted (argmax) class index.
    #[must_use]
    pub fn class_index(&self) -> usize {
        self.class_index
    }

    /// Probability of the predicted class.
    #[must_use]
    pub fn confidence(&self) -> f32 {
        self.probs[self.class_index]
    }

    /// The full probability vector.
    #[must_use]
    pub fn probs(&self) -> &[f32] {
        &self.probs
    }

    /// Number of classes in the vector.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.probs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_probs_picks_argmax() {
        let pred = Prediction::from_probs(vec![0.02, 0.03, 0.91, 0.02, 0.02]).unwrap();
        assert_eq!(pred.class_index(), 2);
        assert!((pred.confidence() - 0.91).abs() < 1e-6);
        assert_eq!(pred.n_classes(), 5);
    }

    #[test]
    fn test_probs_sum_invariant() {
        let pred = Prediction::from_probs(vec![0.2, 0.2, 0.2, 0.2, 0.2]).unwrap();
        let sum: f32 = pred.probs().iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_bad_sum() {
        assert!(Prediction::from_probs(vec![0.5, 0.9]).is_err());
    }

    #[test]
    fn test_rejects_empty() {
        assert!(Prediction::from_probs(vec![]).is_err());
    }

    #[test]
    fn test_rejects_nan() {
        assert!(Prediction::from_probs(vec![f32::NAN, 1.0]).is_err());
    }
}
