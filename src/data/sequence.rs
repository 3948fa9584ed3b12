use crate::error::{Result, TrainError};

/// One supervised time step.
///
/// `importance`, when present, weights each target component in the error
/// and in the back-propagated residual.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub input: Vec<f64>,
    pub target: Vec<f64>,
    pub importance: Option<Vec<f64>>,
}

impl Sample {
    pub fn new(input: Vec<f64>, target: Vec<f64>) -> Sample {
        Sample { input, target, importance: None }
    }

    pub fn with_importance(input: Vec<f64>, target: Vec<f64>, importance: Vec<f64>) -> Sample {
        Sample { input, target, importance: Some(importance) }
    }
}

/// An ordered list of samples sharing input and target dimensionality.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Sequence {
    samples: Vec<Sample>,
}

impl Sequence {
    /// Validates and wraps `samples`.
    ///
    /// # Errors
    /// `InvalidSequence` if dimensions differ between samples, or an importance
    /// vector has the wrong length or a negative (or NaN) entry.
    pub fn new(samples: Vec<Sample>) -> Result<Sequence> {
        if let Some(first) = samples.first() {
            let (indim, outdim) = (first.input.len(), first.target.len());
            for (t, sample) in samples.iter().enumerate() {
                if sample.input.len() != indim || sample.target.len() != outdim {
                    return Err(TrainError::InvalidSequence {
                        message: format!(
                            "sample {t} has dimensions ({}, {}), expected ({indim}, {outdim})",
                            sample.input.len(),
                            sample.target.len()
                        ),
                    });
                }
                if let Some(importance) = &sample.importance {
                    if importance.len() != outdim {
                        return Err(TrainError::InvalidSequence {
                            message: format!(
                                "sample {t} has {} importance values for a target of length {outdim}",
                                importance.len()
                            ),
                        });
                    }
                    if !importance.iter().all(|w| *w >= 0.0) {
                        return Err(TrainError::InvalidSequence {
                            message: format!("sample {t} has a negative importance"),
                        });
                    }
                }
            }
        }
        Ok(Sequence { samples })
    }

    /// Builds a sequence of unweighted samples from parallel input/target lists.
    pub fn from_pairs(inputs: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) -> Result<Sequence> {
        TrainError::check_len("sequence targets", inputs.len(), targets.len())?;
        Sequence::new(inputs.into_iter().zip(targets).map(|(i, t)| Sample::new(i, t)).collect())
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// (input, target) dimensions, or `None` for an empty sequence.
    pub fn dims(&self) -> Option<(usize, usize)> {
        self.samples.first().map(|s| (s.input.len(), s.target.len()))
    }
}
