use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::data::dataset::SequenceDataset;
use crate::data::sequence::Sequence;
use crate::error::{Result, TrainError};
use crate::loss::error_fn::ErrorFunction;
use crate::math::vector::argmax;
use crate::network::module::Module;
use crate::optim::gradient_descent::GradientDescent;
use crate::train::backprop::process_sequence;
use crate::train::train_config::TrainConfig;

/// Step used by `check_gradient` for central finite differences.
pub const GRADIENT_CHECK_EPSILON: f64 = 1e-6;

/// Trains the parameters of a `Module` on a `SequenceDataset` by
/// back-propagating errors through time.
///
/// The trainer owns the optimizer state and the random source used for
/// shuffling, so two trainers built from the same config reproduce the same
/// trajectory. The module is borrowed mutably for each call and must not be
/// shared with another trainer while a run is in progress.
#[derive(Debug, Clone)]
pub struct BackpropTrainer {
    config: TrainConfig,
    optimizer: GradientDescent,
    error_fn: ErrorFunction,
    pub(crate) rng: StdRng,
    pub(crate) epoch: usize,
    total_epochs: usize,
}

/// Analytic and numeric derivative of the error for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientCheck {
    pub analytic: f64,
    pub numeric: f64,
}

impl GradientCheck {
    /// `true` when both values agree within `rel_tol` of the larger magnitude.
    /// Differences below 1e-8 always agree, since finite differences cannot
    /// resolve them.
    pub fn agrees(&self, rel_tol: f64) -> bool {
        let diff = (self.analytic - self.numeric).abs();
        diff < 1e-8 || diff <= rel_tol * self.analytic.abs().max(self.numeric.abs())
    }
}

impl BackpropTrainer {
    /// Creates a trainer whose random source is seeded from `config.seed`.
    pub fn new(config: TrainConfig) -> Result<BackpropTrainer> {
        let rng = StdRng::seed_from_u64(config.seed);
        BackpropTrainer::with_rng(config, rng)
    }

    /// Creates a trainer that shuffles with the supplied random source.
    pub fn with_rng(config: TrainConfig, rng: StdRng) -> Result<BackpropTrainer> {
        config.validate()?;
        let optimizer = GradientDescent::new(config.learning_rate, config.momentum, config.lr_decay);
        Ok(BackpropTrainer {
            config,
            optimizer,
            error_fn: ErrorFunction::default(),
            rng,
            epoch: 0,
            total_epochs: 0,
        })
    }

    pub fn with_error_fn(mut self, error_fn: ErrorFunction) -> Self {
        self.error_fn = error_fn;
        self
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    pub fn optimizer(&self) -> &GradientDescent {
        &self.optimizer
    }

    pub fn error_fn(&self) -> &ErrorFunction {
        &self.error_fn
    }

    /// Epochs trained in the current convergence run.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Epochs trained over the trainer's lifetime.
    pub fn total_epochs(&self) -> usize {
        self.total_epochs
    }

    /// Trains `module` for one epoch over `dataset` and returns the mean
    /// training error (total error over total ponderation).
    ///
    /// Sequences are visited in a freshly shuffled order. In online mode the
    /// parameters are updated after every sequence with the weight-decayed
    /// derivatives; in batch mode once, after the last sequence.
    ///
    /// # Errors
    /// - `EmptyDataset` if `dataset` has no sequences.
    /// - `ZeroPonderation` if no sample contributed to the error.
    /// - shape errors raised by the module.
    pub fn train_epoch<M: Module + ?Sized>(&mut self, module: &mut M, dataset: &SequenceDataset) -> Result<f64> {
        if dataset.is_empty() {
            return Err(TrainError::EmptyDataset);
        }
        // A rejected epoch must leave params and optimizer state untouched.
        if dataset.total_ponderation() <= 0.0 {
            return Err(TrainError::ZeroPonderation);
        }
        module.reset_derivatives();

        let mut order: Vec<&Sequence> = dataset.sequences().collect();
        order.shuffle(&mut self.rng);

        let mut errors = 0.0;
        let mut ponderation = 0.0;
        for seq in order {
            let (e, p) = process_sequence(module, seq, &self.error_fn)?;
            errors += e;
            ponderation += p;
            log::trace!("sequence of {} samples: error {:.6}, ponderation {}", seq.len(), e, p);

            if !self.config.batch_learning {
                let decay = self.config.weight_decay;
                let gradient: Vec<f64> = module.derivs().iter().zip(module.params())
                    .map(|(d, p)| d - decay * p)
                    .collect();
                if let Some(new_params) = self.optimizer.step(module.params(), &gradient, errors) {
                    module.set_params(&new_params)?;
                }
                module.reset_derivatives();
            }
        }

        if self.config.batch_learning {
            if let Some(new_params) = self.optimizer.step(module.params(), module.derivs(), errors) {
                module.set_params(&new_params)?;
            }
        }

        self.epoch += 1;
        self.total_epochs += 1;
        let mean_error = errors / ponderation;
        log::debug!(
            "epoch {} (total {}): training error {:.6}, learning rate {:.6}",
            self.epoch,
            self.total_epochs,
            mean_error,
            self.optimizer.learning_rate()
        );
        Ok(mean_error)
    }

    /// Mean error of `module` over `dataset`, resetting the module before
    /// every sequence.
    ///
    /// # Errors
    /// `ZeroPonderation` if the dataset contributes no samples.
    pub fn test_on_data<M: Module + ?Sized>(&self, module: &mut M, dataset: &SequenceDataset) -> Result<f64> {
        let mut errors = 0.0;
        let mut importances = 0.0;
        for seq in dataset.sequences() {
            module.reset();
            let (e, i) = dataset.evaluate_sequence(|input| module.activate(input), seq)?;
            errors += e;
            importances += i;
        }
        if importances <= 0.0 {
            return Err(TrainError::ZeroPonderation);
        }
        Ok(errors / importances)
    }

    /// Winner-takes-all classification of every sample in `dataset`.
    ///
    /// Returns the argmax of each module output and the argmax of the
    /// corresponding target, in dataset order.
    pub fn test_on_class_data<M: Module + ?Sized>(
        &self,
        module: &mut M,
        dataset: &SequenceDataset,
    ) -> Result<(Vec<usize>, Vec<usize>)> {
        let mut outputs = Vec::with_capacity(dataset.sample_count());
        let mut targets = Vec::with_capacity(dataset.sample_count());
        for seq in dataset.sequences() {
            module.reset();
            for sample in seq.samples() {
                let output = module.activate(&sample.input)?;
                outputs.push(argmax(&output));
                targets.push(argmax(&sample.target));
            }
        }
        Ok((outputs, targets))
    }

    /// Compares the back-propagated derivatives with central finite
    /// differences, one entry per sequence and parameter.
    ///
    /// `analytic` is the error gradient, i.e. the negated derivative buffer,
    /// which is exact for the `Difference` error function. Parameters are
    /// restored and the derivative buffer is cleared afterwards.
    pub fn check_gradient<M: Module + ?Sized>(
        &self,
        module: &mut M,
        dataset: &SequenceDataset,
    ) -> Result<Vec<Vec<GradientCheck>>> {
        let e = GRADIENT_CHECK_EPSILON;
        let mut res = Vec::with_capacity(dataset.len());
        for seq in dataset.sequences() {
            module.reset_derivatives();
            process_sequence(module, seq, &self.error_fn)?;
            let analytic: Vec<f64> = module.derivs().iter().map(|d| -d).collect();

            let mut checks = Vec::with_capacity(analytic.len());
            for (p, analytic) in analytic.into_iter().enumerate() {
                let stored = module.params()[p];
                module.params_mut()[p] = stored + e;
                let (right, _) = process_sequence(module, seq, &self.error_fn)?;
                module.params_mut()[p] = stored - e;
                let (left, _) = process_sequence(module, seq, &self.error_fn)?;
                module.params_mut()[p] = stored;
                checks.push(GradientCheck { analytic, numeric: (right - left) / (2.0 * e) });
            }
            res.push(checks);
        }
        module.reset_derivatives();
        Ok(res)
    }
}
