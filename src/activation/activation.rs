use serde::{Serialize, Deserialize};
use std::f64::consts::E;

/// Squashing functions available to the layers.
///
/// Derivatives are expressed in terms of the layer *output* `y = f(z)`, which
/// is what the layers keep in their time buffers for the backward pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    /// `sigmoid(z)^exponent`; approaches 0 and 1 faster than `Sigmoid` when
    /// `exponent > 1`.
    SteepSigmoid { exponent: f64 },
    Tanh,
    ReLU,
    Identity,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => sigmoid(x),
            ActivationFunction::SteepSigmoid { exponent } => sigmoid(x).powf(*exponent),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
        }
    }

    /// dy/dz evaluated from the output `y`.
    pub fn derivative(&self, y: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => y * (1.0 - y),
            ActivationFunction::SteepSigmoid { exponent } => {
                // y = s^k  =>  dy/dz = k * s^k * (1 - s), with s = y^(1/k)
                let s = y.powf(1.0 / exponent);
                exponent * y * (1.0 - s)
            }
            ActivationFunction::Tanh => 1.0 - y * y,
            ActivationFunction::ReLU => if y > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + E.powf(-x))
}
