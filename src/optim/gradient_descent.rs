/// Gradient descent with momentum and multiplicative learning-rate decay.
///
/// Each call to `step` computes
///
/// ```text
/// velocity = momentum * velocity + learning_rate * gradient
/// params'  = params + velocity
/// learning_rate *= lr_decay
/// ```
///
/// `gradient` is a descent direction (it is added to the parameters). The
/// decay compounds per call, so online training decays once per sequence.
#[derive(Debug, Clone)]
pub struct GradientDescent {
    learning_rate: f64,
    momentum: f64,
    lr_decay: f64,
    velocity: Vec<f64>,
    step_count: usize,
}

impl GradientDescent {
    pub fn new(learning_rate: f64, momentum: f64, lr_decay: f64) -> GradientDescent {
        GradientDescent {
            learning_rate,
            momentum,
            lr_decay,
            velocity: Vec::new(),
            step_count: 0,
        }
    }

    /// Returns the updated parameters, or `None` if `gradient` is empty or does
    /// not match `params` (or the velocity established by earlier steps).
    ///
    /// `current_error` is not used by this policy.
    pub fn step(&mut self, params: &[f64], gradient: &[f64], _current_error: f64) -> Option<Vec<f64>> {
        if gradient.is_empty() || gradient.len() != params.len() {
            return None;
        }
        if self.velocity.is_empty() {
            self.velocity = vec![0.0; gradient.len()];
        } else if self.velocity.len() != gradient.len() {
            return None;
        }

        let (lr, mu) = (self.learning_rate, self.momentum);
        let new_params = params.iter()
            .zip(gradient)
            .zip(self.velocity.iter_mut())
            .map(|((p, g), v)| {
                *v = mu * *v + lr * g;
                p + *v
            })
            .collect();

        self.learning_rate *= self.lr_decay;
        self.step_count += 1;
        Some(new_params)
    }

    /// Learning rate the next step will use.
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn lr_decay(&self) -> f64 {
        self.lr_decay
    }

    /// Step applied by the last call (empty before the first call).
    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Forgets the velocity and step count; the decayed learning rate is kept.
    pub fn reset(&mut self) {
        self.velocity.clear();
        self.step_count = 0;
    }
}
