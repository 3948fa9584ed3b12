use crate::error::{Result, TrainError};

/// Signed residual between a target and a predicted output vector.
///
/// The squared-error convention (`0.5 * r^2`) is applied by the trainer, so an
/// alternative metric only has to supply the residual.
///
/// - `Difference`: `target - predicted` (the default).
/// - `Custom`: caller-supplied function `(target, predicted) -> residual`;
///   it must return a vector of the target's length.
#[derive(Debug, Clone, Copy, Default)]
pub enum ErrorFunction {
    #[default]
    Difference,
    Custom(fn(&[f64], &[f64]) -> Vec<f64>),
}

impl ErrorFunction {
    pub fn residual(&self, target: &[f64], predicted: &[f64]) -> Result<Vec<f64>> {
        TrainError::check_len("predicted output", target.len(), predicted.len())?;
        let residual = match self {
            ErrorFunction::Difference => target.iter().zip(predicted)
                .map(|(t, p)| t - p)
                .collect(),
            ErrorFunction::Custom(f) => f(target, predicted),
        };
        TrainError::check_len("residual", target.len(), residual.len())?;
        Ok(residual)
    }
}
