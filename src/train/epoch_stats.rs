use serde::{Serialize, Deserialize};

/// Per-epoch statistics emitted by `train_until_convergence`.
///
/// When a `progress_tx` channel is configured in `ConvergenceConfig`, the
/// driver sends one `EpochStats` value after every completed epoch, so callers
/// can report progress without the library printing anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number within the run.
    pub epoch: usize,
    /// Mean training error of this epoch.
    pub train_error: f64,
    /// Validation error measured with the weights this epoch produced.
    pub validation_error: f64,
    /// Best validation error seen so far, this epoch included.
    pub best_validation_error: f64,
    pub weight_mean: f64,
    pub weight_std: f64,
    /// Wall-clock duration of the epoch and its validation sweep.
    pub elapsed_ms: u64,
}
