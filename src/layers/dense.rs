use serde::{Serialize, Deserialize};
use crate::activation::activation::ActivationFunction;
use crate::math::vector::dot;

/// Fully connected layer kernel: `y = f(W x + b)`.
///
/// The layer owns no parameters. It reads and writes the slice of its
/// network's flat parameter/derivative vectors laid out as
/// `weights` (row-major, `size x input_size`) followed by `biases` (`size`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub input_size: usize,
    pub activator: ActivationFunction,
}

impl Layer {
    pub fn new(size: usize, input_size: usize, activation: ActivationFunction) -> Layer {
        Layer { size, input_size, activator: activation }
    }

    pub fn paramdim(&self) -> usize {
        self.size * self.input_size + self.size
    }

    pub fn feed_from(&self, params: &[f64], input: &[f64]) -> Vec<f64> {
        let (weights, biases) = params.split_at(self.size * self.input_size);
        (0..self.size)
            .map(|j| {
                let row = &weights[j * self.input_size..(j + 1) * self.input_size];
                self.activator.function(dot(row, input) + biases[j])
            })
            .collect()
    }

    /// Accumulates this step's derivatives into `derivs` and returns the error
    /// with respect to the layer input.
    ///
    /// `out_err` is the error in activation space; `input` and `output` are the
    /// values recorded by `feed_from` for the same time step.
    pub fn compute_gradients(
        &self,
        params: &[f64],
        derivs: &mut [f64],
        input: &[f64],
        output: &[f64],
        out_err: &[f64],
    ) -> Vec<f64> {
        let n_weights = self.size * self.input_size;
        // δ = error ⊙ f'(z), with f' expressed through the stored output
        let delta: Vec<f64> = out_err.iter().zip(output.iter())
            .map(|(e, y)| e * self.activator.derivative(*y))
            .collect();

        let (w_derivs, b_derivs) = derivs.split_at_mut(n_weights);
        for (j, d) in delta.iter().enumerate() {
            let row = &mut w_derivs[j * self.input_size..(j + 1) * self.input_size];
            for (w, x) in row.iter_mut().zip(input.iter()) {
                *w += d * x;
            }
            b_derivs[j] += d;
        }

        let weights = &params[..n_weights];
        (0..self.input_size)
            .map(|k| {
                delta.iter().enumerate()
                    .map(|(j, d)| weights[j * self.input_size + k] * d)
                    .sum()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_from_identity() {
        let layer = Layer::new(2, 2, ActivationFunction::Identity);
        // W = [[1, 2], [3, 4]], b = [0.5, -1]
        let params = [1.0, 2.0, 3.0, 4.0, 0.5, -1.0];
        assert_eq!(layer.feed_from(&params, &[1.0, 1.0]), vec![3.5, 6.0]);
    }

    #[test]
    fn test_compute_gradients_accumulates() {
        let layer = Layer::new(1, 2, ActivationFunction::Identity);
        let params = [2.0, -1.0, 0.0];
        let mut derivs = [0.0; 3];
        let output = layer.feed_from(&params, &[1.0, 3.0]);

        let in_err = layer.compute_gradients(&params, &mut derivs, &[1.0, 3.0], &output, &[0.5]);
        assert_eq!(derivs, [0.5, 1.5, 0.5]);
        assert_eq!(in_err, vec![1.0, -0.5]);

        layer.compute_gradients(&params, &mut derivs, &[1.0, 3.0], &output, &[0.5]);
        assert_eq!(derivs, [1.0, 3.0, 1.0]);
    }
}
