//! Evaluator trait for position evaluation.
//!
//! The evaluator provides raw policy logits and value estimates for a batch of
//! encoded states. In AlphaZero, this is a neural network. For testing and
//! model-free play we provide a uniform evaluator and a closure adapter.

use thiserror::Error;

/// Errors that can occur during evaluation.
#[derive(Debug, Error)]
pub enum EvaluatorError {
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model error: {0}")]
    ModelError(String),
}

/// Output of one batched evaluator call.
///
/// `policy_logits` is row-major `[batch, num_actions]`; `values` has one entry
/// per batch row. Logits are unnormalized: the search applies softmax.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalBatch {
    pub policy_logits: Vec<f32>,
    pub values: Vec<f32>,
}

impl EvalBatch {
    pub fn with_capacity(batch_size: usize, num_actions: usize) -> Self {
        Self {
            policy_logits: Vec::with_capacity(batch_size * num_actions),
            values: Vec::with_capacity(batch_size),
        }
    }

    /// Append one row.
    pub fn push(&mut self, logits: &[f32], value: f32) {
        self.policy_logits.extend_from_slice(logits);
        self.values.push(value);
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Logits for row `i`.
    #[inline]
    pub fn logits(&self, i: usize, num_actions: usize) -> &[f32] {
        &self.policy_logits[i * num_actions..(i + 1) * num_actions]
    }

    #[inline]
    pub fn value(&self, i: usize) -> f32 {
        self.values[i]
    }
}

/// Trait for position evaluators.
///
/// Implementations could be:
/// - UniformEvaluator: zero logits, neutral value (for testing)
/// - FnEvaluator: per-row closure (for tests and scripted opponents)
/// - a trained network behind the actor's `Learner`
pub trait Evaluator: Send + Sync {
    /// Evaluate a batch of encoded states.
    ///
    /// # Arguments
    /// * `observations` - Row-major `[batch_size, observation_size]` floats
    /// * `batch_size` - Number of rows in `observations`
    /// * `num_actions` - Width of each policy row
    fn evaluate(
        &self,
        observations: &[f32],
        batch_size: usize,
        num_actions: usize,
    ) -> Result<EvalBatch, EvaluatorError>;
}

impl<E: Evaluator + ?Sized> Evaluator for &E {
    fn evaluate(
        &self,
        observations: &[f32],
        batch_size: usize,
        num_actions: usize,
    ) -> Result<EvalBatch, EvaluatorError> {
        (**self).evaluate(observations, batch_size, num_actions)
    }
}

impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    fn evaluate(
        &self,
        observations: &[f32],
        batch_size: usize,
        num_actions: usize,
    ) -> Result<EvalBatch, EvaluatorError> {
        (**self).evaluate(observations, batch_size, num_actions)
    }
}

/// Split a flat observation buffer into `batch_size` rows.
pub fn observation_rows(
    observations: &[f32],
    batch_size: usize,
) -> Result<std::slice::Chunks<'_, f32>, EvaluatorError> {
    if batch_size == 0 {
        return Err(EvaluatorError::InvalidInput("empty batch".into()));
    }
    if observations.len() % batch_size != 0 {
        return Err(EvaluatorError::InvalidInput(format!(
            "{} observation floats do not divide into {} rows",
            observations.len(),
            batch_size
        )));
    }
    let width = observations.len() / batch_size;
    if width == 0 {
        return Err(EvaluatorError::InvalidInput(
            "observation rows are empty".into(),
        ));
    }
    Ok(observations.chunks(width))
}

/// Uniform evaluator: all-zero logits (uniform after softmax) and a neutral
/// value. Useful for testing MCTS without a model.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformEvaluator;

impl UniformEvaluator {
    pub fn new() -> Self {
        Self
    }
}

impl Evaluator for UniformEvaluator {
    fn evaluate(
        &self,
        _observations: &[f32],
        batch_size: usize,
        num_actions: usize,
    ) -> Result<EvalBatch, EvaluatorError> {
        Ok(EvalBatch {
            policy_logits: vec![0.0; batch_size * num_actions],
            values: vec![0.0; batch_size],
        })
    }
}

/// Evaluator backed by a per-row closure returning `(logits, value)`.
pub struct FnEvaluator<F> {
    f: F,
}

impl<F> FnEvaluator<F>
where
    F: Fn(&[f32]) -> (Vec<f32>, f32) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> std::fmt::Debug for FnEvaluator<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnEvaluator").finish_non_exhaustive()
    }
}

impl<F> Evaluator for FnEvaluator<F>
where
    F: Fn(&[f32]) -> (Vec<f32>, f32) + Send + Sync,
{
    fn evaluate(
        &self,
        observations: &[f32],
        batch_size: usize,
        num_actions: usize,
    ) -> Result<EvalBatch, EvaluatorError> {
        let mut out = EvalBatch::with_capacity(batch_size, num_actions);
        for row in observation_rows(observations, batch_size)? {
            let (logits, value) = (self.f)(row);
            if logits.len() != num_actions {
                return Err(EvaluatorError::EvaluationFailed(format!(
                    "closure returned {} logits, expected {}",
                    logits.len(),
                    num_actions
                )));
            }
            out.push(&logits, value);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_evaluator_shapes() {
        let eval = UniformEvaluator::new();
        let batch = eval.evaluate(&[0.0; 54], 2, 9).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.policy_logits.len(), 18);
        assert!(batch.logits(1, 9).iter().all(|&l| l == 0.0));
        assert_eq!(batch.value(0), 0.0);
    }

    #[test]
    fn test_fn_evaluator_sees_each_row() {
        let eval = FnEvaluator::new(|row: &[f32]| (vec![row[0]; 3], row[1]));
        let batch = eval.evaluate(&[1.0, 0.5, 2.0, -0.5], 2, 3).unwrap();

        assert_eq!(batch.logits(0, 3), &[1.0, 1.0, 1.0]);
        assert_eq!(batch.logits(1, 3), &[2.0, 2.0, 2.0]);
        assert_eq!(batch.values, vec![0.5, -0.5]);
    }

    #[test]
    fn test_fn_evaluator_rejects_wrong_width() {
        let eval = FnEvaluator::new(|_: &[f32]| (vec![0.0; 2], 0.0));
        let err = eval.evaluate(&[0.0; 4], 1, 3).unwrap_err();
        assert!(matches!(err, EvaluatorError::EvaluationFailed(_)));
    }

    #[test]
    fn test_observation_rows_rejects_ragged_input() {
        assert!(observation_rows(&[0.0; 5], 2).is_err());
        assert!(observation_rows(&[0.0; 4], 0).is_err());
        assert_eq!(observation_rows(&[0.0; 6], 3).unwrap().count(), 3);
    }

    #[test]
    fn test_reference_evaluator_delegates() {
        let eval = UniformEvaluator::new();
        let by_ref: &dyn Evaluator = &eval;
        let batch = (&by_ref).evaluate(&[0.0; 9], 1, 9).unwrap();
        assert_eq!(batch.len(), 1);
    }
}
