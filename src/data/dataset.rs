use rand::seq::SliceRandom;
use rand::Rng;
use crate::data::sequence::Sequence;
use crate::error::{Result, TrainError};
use crate::math::vector::dot;

/// In-memory collection of sequences with fixed input/target dimensions.
///
/// `sequences()` hands out a fresh iterator on every call, so iterating the
/// dataset again is all it takes to restart it.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDataset {
    indim: usize,
    outdim: usize,
    sequences: Vec<Sequence>,
}

impl SequenceDataset {
    pub fn new(indim: usize, outdim: usize) -> SequenceDataset {
        SequenceDataset { indim, outdim, sequences: Vec::new() }
    }

    pub fn from_sequences(indim: usize, outdim: usize, sequences: Vec<Sequence>) -> Result<SequenceDataset> {
        let mut ds = SequenceDataset::new(indim, outdim);
        for seq in sequences {
            ds.add_sequence(seq)?;
        }
        Ok(ds)
    }

    /// Appends a sequence whose samples match the dataset dimensions.
    pub fn add_sequence(&mut self, sequence: Sequence) -> Result<()> {
        if let Some((indim, outdim)) = sequence.dims() {
            TrainError::check_len("sequence input", self.indim, indim)?;
            TrainError::check_len("sequence target", self.outdim, outdim)?;
        }
        self.sequences.push(sequence);
        Ok(())
    }

    pub fn indim(&self) -> usize {
        self.indim
    }

    pub fn outdim(&self) -> usize {
        self.outdim
    }

    /// Number of sequences.
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn sequences(&self) -> std::slice::Iter<'_, Sequence> {
        self.sequences.iter()
    }

    /// Total number of samples over all sequences.
    pub fn sample_count(&self) -> usize {
        self.sequences.iter().map(Sequence::len).sum()
    }

    /// Sum of the importance weights over all samples, counting an unweighted
    /// sample as its target length. Equals the ponderation any error pass
    /// over the whole dataset reports.
    pub fn total_ponderation(&self) -> f64 {
        self.sequences.iter()
            .flat_map(|seq| seq.samples())
            .map(|s| match &s.importance {
                Some(importance) => importance.iter().sum::<f64>(),
                None => s.target.len() as f64,
            })
            .sum()
    }

    /// Randomly splits the sequences in two. The first dataset receives
    /// `floor(len * proportion)` sequences, the second the rest.
    ///
    /// # Errors
    /// `InvalidConfig` if `proportion` is outside [0, 1].
    pub fn split_with_proportion<R: Rng + ?Sized>(
        &self,
        proportion: f64,
        rng: &mut R,
    ) -> Result<(SequenceDataset, SequenceDataset)> {
        if !(0.0..=1.0).contains(&proportion) {
            return Err(TrainError::invalid_config(format!(
                "split proportion must lie in [0, 1], got {proportion}"
            )));
        }
        let mut indices: Vec<usize> = (0..self.len()).collect();
        indices.shuffle(rng);
        let cut = (self.len() as f64 * proportion) as usize;

        let pick = |idx: &[usize]| SequenceDataset {
            indim: self.indim,
            outdim: self.outdim,
            sequences: idx.iter().map(|&i| self.sequences[i].clone()).collect(),
        };
        Ok((pick(&indices[..cut]), pick(&indices[cut..])))
    }

    /// Runs `activate` over one sequence and scores the outputs.
    ///
    /// Returns `(error, ponderation)` where `error` is `0.5 * sum(w * r^2)` with
    /// residual `r = target - output` and `ponderation` is the sum of the
    /// importance weights (the target length for unweighted samples).
    pub fn evaluate_sequence<F>(&self, mut activate: F, sequence: &Sequence) -> Result<(f64, f64)>
    where
        F: FnMut(&[f64]) -> Result<Vec<f64>>,
    {
        let mut error = 0.0;
        let mut ponderation = 0.0;
        for sample in sequence.samples() {
            let output = activate(&sample.input)?;
            TrainError::check_len("evaluated output", sample.target.len(), output.len())?;
            let squared: Vec<f64> = sample.target.iter().zip(&output)
                .map(|(t, o)| (t - o).powi(2))
                .collect();
            match &sample.importance {
                Some(importance) => {
                    error += 0.5 * dot(importance, &squared);
                    ponderation += importance.iter().sum::<f64>();
                }
                None => {
                    error += 0.5 * squared.iter().sum::<f64>();
                    ponderation += sample.target.len() as f64;
                }
            }
        }
        Ok((error, ponderation))
    }
}
