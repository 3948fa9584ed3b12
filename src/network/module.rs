use crate::error::{Result, TrainError};

/// A trainable, possibly recurrent, network module.
///
/// The forward/backward protocol is order dependent. After `reset()` the
/// module accepts `activate` calls, each advancing an internal time index and
/// buffering one output. The first `back_activate` call switches the module to
/// its backward phase: every call consumes the most recent unconsumed time step,
/// accumulates (never overwrites) into the derivative buffer and decrements the
/// time index. Calling `activate` again before `reset()` is an error.
///
/// The derivative buffer holds the descent direction, i.e. the negative
/// gradient of `0.5 * |target - output|^2` when fed the residual
/// `target - output`.
///
/// A module is exclusively borrowed by one trainer for the duration of a run.
pub trait Module {
    /// Input vector length.
    fn indim(&self) -> usize;

    /// Output vector length.
    fn outdim(&self) -> usize;

    /// Flat parameter vector.
    fn params(&self) -> &[f64];

    fn params_mut(&mut self) -> &mut [f64];

    /// Accumulated derivatives, same shape as `params()`.
    fn derivs(&self) -> &[f64];

    fn derivs_mut(&mut self) -> &mut [f64];

    /// Clears the time index and the per-step buffers. Parameters and
    /// derivatives are untouched.
    fn reset(&mut self);

    /// Feeds one time step forward and returns its output.
    fn activate(&mut self, input: &[f64]) -> Result<Vec<f64>>;

    /// Back-propagates the output error of the latest unconsumed time step and
    /// returns the error with respect to that step's input.
    fn back_activate(&mut self, out_err: &[f64]) -> Result<Vec<f64>>;

    /// Buffered output at time step `t`, if it has been computed since the
    /// last reset.
    fn output(&self, t: usize) -> Option<&[f64]>;

    /// Number of parameters.
    fn paramdim(&self) -> usize {
        self.params().len()
    }

    /// Zeroes the derivative buffer.
    fn reset_derivatives(&mut self) {
        self.derivs_mut().iter_mut().for_each(|d| *d = 0.0);
    }

    /// Overwrites all parameters; `params.len()` must equal `paramdim()`.
    fn set_params(&mut self, params: &[f64]) -> Result<()> {
        TrainError::check_len("params", self.paramdim(), params.len())?;
        self.params_mut().copy_from_slice(params);
        Ok(())
    }
}
