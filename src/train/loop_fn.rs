use std::sync::atomic::Ordering;
use std::time::Instant;

use serde::{Serialize, Deserialize};

use crate::data::dataset::SequenceDataset;
use crate::error::{Result, TrainError};
use crate::math::vector::{mean, round_to, std_dev};
use crate::network::module::Module;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::ConvergenceConfig;
use crate::train::trainer::BackpropTrainer;

/// Why a convergence run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// `max_epochs` epochs were trained.
    EpochLimitReached,
    /// The latest window of validation errors is entirely worse than the one
    /// before it.
    Regression,
    /// The latest window of validation errors no longer changes at the
    /// configured precision.
    Plateau,
    /// The stop flag was raised or the progress receiver went away.
    Stopped,
}

/// Outcome of `train_until_convergence`.
///
/// Histories are truncated at the best epoch: entry `i` belongs to epoch
/// `i`, and only epochs before `best_epoch` (0-based) are kept. The initial
/// validation baseline is not part of `validation_errors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    pub training_errors: Vec<f64>,
    pub validation_errors: Vec<f64>,
    pub best_epoch: usize,
    pub best_validation_error: f64,
    pub epochs_trained: usize,
    pub stop_reason: StopReason,
}

enum RunState {
    Training,
    Evaluating { training_error: f64, started: Instant },
    Finished(StopReason),
}

/// Applies the look-back stop rule to the validation history (baseline
/// included).
///
/// With `c = continue_epochs`, nothing is decided until `2 * c` values exist.
/// Then, comparing the last `c` values (`new`) with the `c` before them (`old`):
/// - `Regression` if `min(new) > max(old)`;
/// - `Plateau` if every value of `new` rounds, at `precision` decimals, to the
///   rounded last value.
pub fn convergence_check(validation_errors: &[f64], continue_epochs: usize, precision: u32) -> Option<StopReason> {
    let c = continue_epochs;
    let n = validation_errors.len();
    if c == 0 || n < 2 * c {
        return None;
    }
    let old = &validation_errors[n - 2 * c..n - c];
    let new = &validation_errors[n - c..];

    let min_new = new.iter().copied().fold(f64::INFINITY, f64::min);
    let max_old = old.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min_new > max_old {
        return Some(StopReason::Regression);
    }

    let last = round_to(new[c - 1], precision);
    if new.iter().all(|y| round_to(*y, precision) == last) {
        return Some(StopReason::Plateau);
    }
    None
}

impl BackpropTrainer {
    /// Trains until the validation error stops improving, holding out
    /// `config.validation_proportion` of the sequences of `dataset` for
    /// validation. The split is drawn from the trainer's random source.
    ///
    /// See `train_until_convergence_on` for the run semantics.
    ///
    /// # Errors
    /// `SplitTooSmall` if either split would be empty.
    pub fn train_until_convergence<M: Module + ?Sized>(
        &mut self,
        module: &mut M,
        dataset: &SequenceDataset,
        config: &ConvergenceConfig,
    ) -> Result<ConvergenceReport> {
        config.validate()?;
        let (training, validation) =
            dataset.split_with_proportion(1.0 - config.validation_proportion, &mut self.rng)?;
        if training.is_empty() || validation.is_empty() {
            return Err(TrainError::SplitTooSmall { proportion: config.validation_proportion });
        }
        self.train_until_convergence_on(module, &training, &validation, config)
    }

    /// Trains on `training` epoch by epoch, scoring `validation` with the
    /// freshly updated weights after every epoch.
    ///
    /// The best parameters (lowest validation error; the first epoch always
    /// counts, ties never do) are snapshotted and written back into `module`
    /// when the run ends, whether by `max_epochs`, the look-back stop rule
    /// (`convergence_check`), the stop flag, or a dropped progress receiver.
    ///
    /// # Errors
    /// - `EmptyDataset` if either dataset has no sequences.
    /// - `NumericDivergence` if an epoch yields a NaN training or validation
    ///   error; the best parameters are restored before returning.
    pub fn train_until_convergence_on<M: Module + ?Sized>(
        &mut self,
        module: &mut M,
        training: &SequenceDataset,
        validation: &SequenceDataset,
        config: &ConvergenceConfig,
    ) -> Result<ConvergenceReport> {
        config.validate()?;
        if training.is_empty() || validation.is_empty() {
            return Err(TrainError::EmptyDataset);
        }

        self.epoch = 0;
        let mut best_params = module.params().to_vec();
        let mut best_error = self.test_on_data(module, validation)?;
        let mut best_epoch = 0;
        let mut training_errors = Vec::new();
        let mut validation_errors = vec![best_error];
        let mut epochs = 0;
        log::info!(
            "training until convergence on {} sequences ({} held out), baseline validation error {:.6}",
            training.len(),
            validation.len(),
            best_error
        );

        let mut state = RunState::Training;
        let reason = loop {
            state = match state {
                RunState::Finished(reason) => break reason,
                RunState::Training => {
                    let stop_requested = config.stop_flag.as_ref()
                        .is_some_and(|flag| flag.load(Ordering::Relaxed));
                    if stop_requested {
                        RunState::Finished(StopReason::Stopped)
                    } else if config.max_epochs.is_some_and(|max| epochs >= max) {
                        RunState::Finished(StopReason::EpochLimitReached)
                    } else {
                        let started = Instant::now();
                        let training_error = self.train_epoch(module, training)?;
                        RunState::Evaluating { training_error, started }
                    }
                }
                RunState::Evaluating { training_error, started } => {
                    let validation_error = self.test_on_data(module, validation)?;
                    if training_error.is_nan() || validation_error.is_nan() {
                        module.set_params(&best_params)?;
                        return Err(TrainError::NumericDivergence {
                            epoch: epochs,
                            training_error,
                            validation_error,
                        });
                    }
                    training_errors.push(training_error);
                    validation_errors.push(validation_error);

                    if epochs == 0 || validation_error < best_error {
                        best_error = validation_error;
                        best_params = module.params().to_vec();
                        best_epoch = epochs;
                    }
                    epochs += 1;

                    let stats = EpochStats {
                        epoch: epochs,
                        train_error: training_error,
                        validation_error,
                        best_validation_error: best_error,
                        weight_mean: mean(module.params()),
                        weight_std: std_dev(module.params()),
                        elapsed_ms: started.elapsed().as_millis() as u64,
                    };
                    log::debug!(
                        "epoch {:6}  training error {:12.5e}  validation error {:12.5e}  weight mean {:10.5}  weight std {:10.5}",
                        stats.epoch,
                        stats.train_error,
                        stats.validation_error,
                        stats.weight_mean,
                        stats.weight_std
                    );

                    let receiver_gone = config.progress_tx.as_ref()
                        .is_some_and(|tx| tx.send(stats).is_err());
                    if receiver_gone {
                        RunState::Finished(StopReason::Stopped)
                    } else {
                        match convergence_check(&validation_errors, config.continue_epochs, config.convergence_precision) {
                            Some(reason) => RunState::Finished(reason),
                            None => RunState::Training,
                        }
                    }
                }
            };
        };

        module.set_params(&best_params)?;
        log::info!(
            "stopped after {} epochs ({:?}); best validation error {:.6} at epoch {}",
            epochs,
            reason,
            best_error,
            best_epoch
        );

        training_errors.truncate(best_epoch);
        validation_errors.truncate(best_epoch + 1);
        validation_errors.remove(0);
        Ok(ConvergenceReport {
            training_errors,
            validation_errors,
            best_epoch,
            best_validation_error: best_error,
            epochs_trained: epochs,
            stop_reason: reason,
        })
    }
}
