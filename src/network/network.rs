use rand::Rng;
use crate::activation::activation::ActivationFunction;
use crate::error::{Result, TrainError};
use crate::layers::dense::Layer;
use crate::math::vector::random_uniform;
use crate::network::module::Module;
use crate::network::trace::StepTrace;

/// Feed-forward stack of dense layers exposed as one `Module`.
///
/// All layer parameters live in a single flat vector; layer `i` owns the
/// slice starting at `offsets[i]`. Each time step records the input and every
/// layer activation, so a sequence can be back-propagated step by step.
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    params: Vec<f64>,
    derivs: Vec<f64>,
    offsets: Vec<usize>,
    trace: StepTrace,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples, with
    /// parameters drawn uniformly from [-1, 1).
    pub fn new<R: Rng + ?Sized>(
        layer_specs: Vec<(usize, usize, ActivationFunction)>,
        rng: &mut R,
    ) -> Result<Network> {
        if layer_specs.is_empty() {
            return Err(TrainError::invalid_config("a network needs at least one layer"));
        }
        let layers: Vec<Layer> = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation))
            .collect();
        for pair in layers.windows(2) {
            TrainError::check_len("layer input size", pair[0].size, pair[1].input_size)?;
        }

        let mut offsets = Vec::with_capacity(layers.len());
        let mut paramdim = 0;
        for layer in &layers {
            offsets.push(paramdim);
            paramdim += layer.paramdim();
        }

        Ok(Network {
            layers,
            params: random_uniform(paramdim, rng),
            derivs: vec![0.0; paramdim],
            offsets,
            trace: StepTrace::new(),
        })
    }

    /// Layer shapes, in feed order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Stateless forward pass; does not touch the time buffers.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        TrainError::check_len("network input", self.indim(), input.len())?;
        let mut current = input.to_vec();
        for (layer, offset) in self.layers.iter().zip(&self.offsets) {
            current = layer.feed_from(&self.params[*offset..*offset + layer.paramdim()], &current);
        }
        Ok(current)
    }
}

impl Module for Network {
    fn indim(&self) -> usize {
        self.layers[0].input_size
    }

    fn outdim(&self) -> usize {
        self.layers[self.layers.len() - 1].size
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
    }

    fn activate(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        TrainError::check_len("network input", self.indim(), input.len())?;
        let mut buffers = Vec::with_capacity(self.layers.len() + 1);
        buffers.push(input.to_vec());
        for (layer, offset) in self.layers.iter().zip(&self.offsets) {
            let next = layer.feed_from(&self.params[*offset..*offset + layer.paramdim()], &buffers[buffers.len() - 1]);
            buffers.push(next);
        }
        let output = buffers[buffers.len() - 1].clone();
        self.trace.push(buffers)?;
        Ok(output)
    }

    fn back_activate(&mut self, out_err: &[f64]) -> Result<Vec<f64>> {
        TrainError::check_len("network output error", self.outdim(), out_err.len())?;
        let t = self.trace.rewind()?;
        let step = self.trace.step(t);

        let mut err = out_err.to_vec();
        for (i, layer) in self.layers.iter().enumerate().rev() {
            let range = self.offsets[i]..self.offsets[i] + layer.paramdim();
            err = layer.compute_gradients(
                &self.params[range.clone()],
                &mut self.derivs[range],
                &step[i],
                &step[i + 1],
                &err,
            );
        }
        Ok(err)
    }

    fn output(&self, t: usize) -> Option<&[f64]> {
        self.trace.output(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn xor_net() -> Network {
        Network::new(
            vec![
                (2, 2, ActivationFunction::Sigmoid),
                (1, 2, ActivationFunction::Sigmoid),
            ],
            &mut StdRng::seed_from_u64(42),
        )
        .unwrap()
    }

    #[test]
    fn test_paramdim_and_dims() {
        let net = xor_net();
        assert_eq!(net.paramdim(), 2 * 2 + 2 + 2 + 1);
        assert_eq!(net.indim(), 2);
        assert_eq!(net.outdim(), 1);
        let shapes: Vec<(usize, usize)> = net.layers().iter().map(|l| (l.size, l.input_size)).collect();
        assert_eq!(shapes, vec![(2, 2), (1, 2)]);
    }

    #[test]
    fn test_rejects_mismatched_layers() {
        let res = Network::new(
            vec![
                (3, 2, ActivationFunction::Sigmoid),
                (1, 2, ActivationFunction::Sigmoid),
            ],
            &mut StdRng::seed_from_u64(0),
        );
        assert!(matches!(res, Err(TrainError::ShapeMismatch { expected: 3, actual: 2, .. })));
    }

    #[test]
    fn test_activate_matches_forward_and_buffers_outputs() {
        let mut net = xor_net();
        let a = net.activate(&[1.0, 0.0]).unwrap();
        let b = net.activate(&[0.0, 1.0]).unwrap();
        assert_eq!(a, net.forward(&[1.0, 0.0]).unwrap());
        assert_eq!(net.output(0), Some(a.as_slice()));
        assert_eq!(net.output(1), Some(b.as_slice()));
        assert_eq!(net.output(2), None);
    }

    #[test]
    fn test_single_sigmoid_unit_gradient() {
        let mut net = Network::new(vec![(1, 1, ActivationFunction::Sigmoid)], &mut StdRng::seed_from_u64(0)).unwrap();
        net.set_params(&[0.3, -0.2]).unwrap();
        let y = net.activate(&[2.0]).unwrap()[0];
        net.back_activate(&[0.5]).unwrap();
        let delta = 0.5 * (y * (1.0 - y));
        assert_eq!(net.derivs(), &[delta * 2.0, delta]);
    }

    #[test]
    fn test_back_activate_requires_forward_step() {
        let mut net = xor_net();
        assert!(matches!(net.back_activate(&[1.0]), Err(TrainError::TimeIndex { .. })));
    }
}
