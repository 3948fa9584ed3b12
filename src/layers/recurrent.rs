use rand::Rng;
use crate::activation::activation::ActivationFunction;
use crate::error::{Result, TrainError};
use crate::math::vector::{dot, random_uniform};
use crate::network::module::Module;
use crate::network::trace::StepTrace;

// Buffer slots recorded per time step.
const INPUT: usize = 0;
const PREV_HIDDEN: usize = 1;
const HIDDEN: usize = 2;

/// Elman recurrent layer: `h_t = f(W_in x_t + W_rec h_{t-1} + b)`, `h_{-1} = 0`.
///
/// The hidden state is the module output. Parameters are laid out as
/// `W_in` (`size x input_size`), `W_rec` (`size x size`), then `b` (`size`).
/// The backward pass carries the recurrent error from step `t + 1` into step
/// `t`, which is why it must visit the steps in reverse order.
#[derive(Debug, Clone)]
pub struct RecurrentLayer {
    pub size: usize,
    pub input_size: usize,
    pub activator: ActivationFunction,
    params: Vec<f64>,
    derivs: Vec<f64>,
    trace: StepTrace,
    carry: Vec<f64>,
}

impl RecurrentLayer {
    /// Creates a layer with parameters drawn uniformly from [-1, 1).
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        rng: &mut R,
    ) -> RecurrentLayer {
        let paramdim = size * input_size + size * size + size;
        RecurrentLayer {
            size,
            input_size,
            activator: activation,
            params: random_uniform(paramdim, rng),
            derivs: vec![0.0; paramdim],
            trace: StepTrace::new(),
            carry: vec![0.0; size],
        }
    }

    fn split_params(&self) -> (&[f64], &[f64], &[f64]) {
        let (w_in, rest) = self.params.split_at(self.size * self.input_size);
        let (w_rec, b) = rest.split_at(self.size * self.size);
        (w_in, w_rec, b)
    }
}

impl Module for RecurrentLayer {
    fn indim(&self) -> usize {
        self.input_size
    }

    fn outdim(&self) -> usize {
        self.size
    }

    fn params(&self) -> &[f64] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [f64] {
        &mut self.params
    }

    fn derivs(&self) -> &[f64] {
        &self.derivs
    }

    fn derivs_mut(&mut self) -> &mut [f64] {
        &mut self.derivs
    }

    fn reset(&mut self) {
        self.trace.reset();
        self.carry.iter_mut().for_each(|c| *c = 0.0);
    }

    fn activate(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        TrainError::check_len("recurrent input", self.input_size, input.len())?;
        let prev = match self.trace.last() {
            Some(step) => step[HIDDEN].clone(),
            None => vec![0.0; self.size],
        };

        let (w_in, w_rec, b) = self.split_params();
        let hidden: Vec<f64> = (0..self.size)
            .map(|j| {
                let z = dot(&w_in[j * self.input_size..(j + 1) * self.input_size], input)
                    + dot(&w_rec[j * self.size..(j + 1) * self.size], &prev)
                    + b[j];
                self.activator.function(z)
            })
            .collect();

        self.trace.push(vec![input.to_vec(), prev, hidden.clone()])?;
        Ok(hidden)
    }

    fn back_activate(&mut self, out_err: &[f64]) -> Result<Vec<f64>> {
        TrainError::check_len("recurrent output error", self.size, out_err.len())?;
        let t = self.trace.rewind()?;
        let step = self.trace.step(t);
        let (input, prev, hidden) = (&step[INPUT], &step[PREV_HIDDEN], &step[HIDDEN]);

        let delta: Vec<f64> = out_err.iter().zip(self.carry.iter()).zip(hidden.iter())
            .map(|((e, c), h)| (e + c) * self.activator.derivative(*h))
            .collect();

        let n_in = self.size * self.input_size;
        let n_rec = self.size * self.size;
        let (d_in, rest) = self.derivs.split_at_mut(n_in);
        let (d_rec, d_b) = rest.split_at_mut(n_rec);
        for (j, d) in delta.iter().enumerate() {
            for (w, x) in d_in[j * self.input_size..(j + 1) * self.input_size].iter_mut().zip(input) {
                *w += d * x;
            }
            for (w, h) in d_rec[j * self.size..(j + 1) * self.size].iter_mut().zip(prev) {
                *w += d * h;
            }
            d_b[j] += d;
        }

        let w_in = &self.params[..n_in];
        let w_rec = &self.params[n_in..n_in + n_rec];
        for (k, c) in self.carry.iter_mut().enumerate() {
            *c = delta.iter().enumerate().map(|(j, d)| w_rec[j * self.size + k] * d).sum();
        }
        let in_err = (0..self.input_size)
            .map(|k| delta.iter().enumerate().map(|(j, d)| w_in[j * self.input_size + k] * d).sum())
            .collect();
        Ok(in_err)
    }

    fn output(&self, t: usize) -> Option<&[f64]> {
        self.trace.output(t)
    }
}
