use crate::data::sequence::Sequence;
use crate::error::{Result, TrainError};
use crate::loss::error_fn::ErrorFunction;
use crate::math::vector::{dot, hadamard};
use crate::network::module::Module;

/// Runs `sequence` forward through `module`, then back-propagates the output
/// errors through time. Derivatives accumulate in the module.
///
/// Returns `(error, ponderation)`: the summed `0.5 * w * r^2` over all steps
/// and the summed importance (target length for unweighted samples). An empty
/// sequence yields `(0.0, 0.0)`.
pub fn process_sequence<M: Module + ?Sized>(
    module: &mut M,
    sequence: &Sequence,
    error_fn: &ErrorFunction,
) -> Result<(f64, f64)> {
    module.reset();
    for sample in sequence.samples() {
        module.activate(&sample.input)?;
    }

    let mut error = 0.0;
    let mut ponderation = 0.0;
    // Reverse order: each back_activate consumes the latest unconsumed step.
    for (t, sample) in sequence.samples().iter().enumerate().rev() {
        let output = module.output(t).ok_or(TrainError::TimeIndex {
            message: "no buffered output for a forwarded time step",
        })?;
        let residual = error_fn.residual(&sample.target, output)?;
        let squared: Vec<f64> = residual.iter().map(|r| r * r).collect();

        let out_err = match &sample.importance {
            Some(importance) => {
                error += 0.5 * dot(importance, &squared);
                ponderation += importance.iter().sum::<f64>();
                hadamard(&residual, importance)
            }
            None => {
                error += 0.5 * squared.iter().sum::<f64>();
                ponderation += sample.target.len() as f64;
                residual
            }
        };
        module.back_activate(&out_err)?;
    }

    Ok((error, ponderation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::data::sequence::Sample;
    use crate::layers::recurrent::RecurrentLayer;
    use crate::network::network::Network;
    use rand::{rngs::StdRng, SeedableRng};

    fn unit(params: &[f64]) -> Network {
        let mut net = Network::new(vec![(1, 1, ActivationFunction::Sigmoid)], &mut StdRng::seed_from_u64(0)).unwrap();
        net.set_params(params).unwrap();
        net
    }

    #[test]
    fn test_zero_inputs_and_targets_give_zero_error() {
        let mut net = Network::new(vec![(2, 2, ActivationFunction::Tanh)], &mut StdRng::seed_from_u64(5)).unwrap();
        net.set_params(&[0.4, -0.3, 0.8, 0.1, 0.0, 0.0]).unwrap();
        let seq = Sequence::from_pairs(vec![vec![0.0, 0.0]; 3], vec![vec![0.0, 0.0]; 3]).unwrap();
        let (error, ponderation) = process_sequence(&mut net, &seq, &ErrorFunction::Difference).unwrap();
        assert_eq!(error, 0.0);
        assert_eq!(ponderation, 6.0);
    }

    #[test]
    fn test_empty_sequence() {
        let mut net = unit(&[0.5, 0.5]);
        let (error, ponderation) = process_sequence(&mut net, &Sequence::default(), &ErrorFunction::Difference).unwrap();
        assert_eq!((error, ponderation), (0.0, 0.0));
        assert!(net.derivs().iter().all(|d| *d == 0.0));
    }

    #[test]
    fn test_single_step_matches_manual_gradient() {
        let (w, b, x, target) = (0.3, -0.2, 2.0, 1.0);
        let mut net = unit(&[w, b]);
        let seq = Sequence::from_pairs(vec![vec![x]], vec![vec![target]]).unwrap();
        let (error, ponderation) = process_sequence(&mut net, &seq, &ErrorFunction::Difference).unwrap();

        let y = ActivationFunction::Sigmoid.function(w * x + b);
        let r = target - y;
        assert!((error - 0.5 * r * r).abs() < 1e-15);
        assert_eq!(ponderation, 1.0);

        let delta = r * (y * (1.0 - y));
        assert_eq!(net.derivs(), &[delta * x, delta]);
    }

    #[test]
    fn test_importance_weights_error_and_backward_signal() {
        let mut weighted = unit(&[0.3, -0.2]);
        let seq = Sequence::new(vec![Sample::with_importance(vec![1.0], vec![1.0], vec![0.0])]).unwrap();
        let (error, ponderation) = process_sequence(&mut weighted, &seq, &ErrorFunction::Difference).unwrap();
        assert_eq!(error, 0.0);
        assert_eq!(ponderation, 0.0);
        assert!(weighted.derivs().iter().all(|d| *d == 0.0));

        let mut doubled = unit(&[0.3, -0.2]);
        let mut plain = unit(&[0.3, -0.2]);
        let seq2 = Sequence::new(vec![Sample::with_importance(vec![1.0], vec![1.0], vec![2.0])]).unwrap();
        let seq1 = Sequence::from_pairs(vec![vec![1.0]], vec![vec![1.0]]).unwrap();
        let (e2, p2) = process_sequence(&mut doubled, &seq2, &ErrorFunction::Difference).unwrap();
        let (e1, p1) = process_sequence(&mut plain, &seq1, &ErrorFunction::Difference).unwrap();
        assert!((e2 - 2.0 * e1).abs() < 1e-15);
        assert_eq!((p1, p2), (1.0, 2.0));
        assert!((doubled.derivs()[1] - 2.0 * plain.derivs()[1]).abs() < 1e-15);
    }

    #[test]
    fn test_derivatives_accumulate_across_calls() {
        let mut net = unit(&[0.3, -0.2]);
        let seq = Sequence::from_pairs(vec![vec![1.0], vec![-1.0]], vec![vec![1.0], vec![0.0]]).unwrap();
        process_sequence(&mut net, &seq, &ErrorFunction::Difference).unwrap();
        let once = net.derivs().to_vec();
        process_sequence(&mut net, &seq, &ErrorFunction::Difference).unwrap();
        for (twice, once) in net.derivs().iter().zip(&once) {
            assert!((twice - 2.0 * once).abs() < 1e-15);
        }
    }

    #[test]
    fn test_target_dimension_mismatch_is_structural() {
        let mut net = unit(&[0.3, -0.2]);
        let seq = Sequence::from_pairs(vec![vec![1.0]], vec![vec![1.0, 0.0]]).unwrap();
        let err = process_sequence(&mut net, &seq, &ErrorFunction::Difference).unwrap_err();
        assert!(matches!(err, TrainError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_recurrent_sequence_runs_backward_through_every_step() {
        let mut layer = RecurrentLayer::new(2, 1, ActivationFunction::Tanh, &mut StdRng::seed_from_u64(9));
        let seq = Sequence::from_pairs(
            vec![vec![1.0], vec![0.5], vec![-0.5]],
            vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![0.5, 0.5]],
        )
        .unwrap();
        let (_, ponderation) = process_sequence(&mut layer, &seq, &ErrorFunction::Difference).unwrap();
        assert_eq!(ponderation, 6.0);
        // All steps consumed: another backward call has nothing left.
        assert!(layer.back_activate(&[0.0, 0.0]).is_err());
    }
}
