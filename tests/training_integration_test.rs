//! End-to-end checks of the training engine through the public API.

use std::sync::mpsc;

use rand::{rngs::StdRng, Rng, SeedableRng};

use ferrite_bptt::{
    ActivationFunction, BackpropTrainer, ConvergenceConfig, EpochStats, ErrorKind, Module,
    Network, RecurrentLayer, Sample, Sequence, SequenceDataset, TrainConfig, TrainError,
};

const REL_TOLERANCE: f64 = 1e-4;

fn sigmoid_unit(params: &[f64]) -> Network {
    let mut net = Network::new(vec![(1, 1, ActivationFunction::Sigmoid)], &mut StdRng::seed_from_u64(0))
        .expect("Network build should succeed");
    net.set_params(params).expect("params should fit");
    net
}

/// Four samples in one sequence; the input alone cannot predict the target.
fn xor_like_sequence() -> SequenceDataset {
    let seq = Sequence::from_pairs(
        vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
        vec![vec![0.0], vec![1.0], vec![0.0], vec![1.0]],
    )
    .expect("valid sequence");
    SequenceDataset::from_sequences(1, 1, vec![seq]).expect("valid dataset")
}

fn random_sequence(rng: &mut StdRng, len: usize, indim: usize, outdim: usize) -> Sequence {
    let samples = (0..len)
        .map(|_| {
            let input = (0..indim).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let target = (0..outdim).map(|_| rng.gen_range(-0.9..0.9)).collect();
            Sample::new(input, target)
        })
        .collect();
    Sequence::new(samples).expect("valid sequence")
}

#[test]
fn test_sigmoid_unit_converges_within_epoch_limit() {
    let ds = xor_like_sequence();
    let mut module = sigmoid_unit(&[0.5, 0.5]);
    let mut trainer = BackpropTrainer::new(TrainConfig::new().learning_rate(0.5).lr_decay(1.0).momentum(0.0).seed(3))
        .expect("valid config");

    let (tx, rx) = mpsc::channel();
    let config = ConvergenceConfig::new().max_epochs(50).continue_epochs(5).progress(tx);
    let report = trainer
        .train_until_convergence_on(&mut module, &ds, &ds, &config)
        .expect("training should not fail");
    drop(config);

    let stats: Vec<EpochStats> = rx.iter().collect();
    assert!(report.epochs_trained <= 50);
    assert_eq!(stats.len(), report.epochs_trained);
    assert!(stats.len() >= 6, "stopped after {} epochs", stats.len());
    for pair in stats[..6].windows(2) {
        assert!(
            pair[1].train_error < pair[0].train_error,
            "training error should decrease: {} -> {}",
            pair[0].train_error,
            pair[1].train_error
        );
    }
    // The best constant fit predicts 0.5 everywhere: mean error 0.5 * 0.25.
    assert!(report.best_validation_error < stats[0].train_error);
    assert!(report.best_validation_error >= 0.125 - 1e-12);
}

#[test]
fn test_finite_differences_match_feed_forward_gradient() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut net = Network::new(
        vec![
            (4, 3, ActivationFunction::Tanh),
            (2, 4, ActivationFunction::SteepSigmoid { exponent: 2.0 }),
        ],
        &mut rng,
    )
    .expect("Network build should succeed");
    let seqs = (0..3).map(|_| random_sequence(&mut rng, 4, 3, 2)).collect();
    let ds = SequenceDataset::from_sequences(3, 2, seqs).expect("valid dataset");

    let trainer = BackpropTrainer::new(TrainConfig::default()).expect("valid config");
    let checks = trainer.check_gradient(&mut net, &ds).expect("gradient check should run");
    assert_eq!(checks.len(), 3);
    for (seq, per_param) in checks.iter().enumerate() {
        for (p, c) in per_param.iter().enumerate() {
            assert!(c.agrees(REL_TOLERANCE), "sequence {seq}, parameter {p}: {c:?}");
        }
    }
}

#[test]
fn test_finite_differences_match_recurrent_gradient() {
    let mut rng = StdRng::seed_from_u64(77);
    let mut layer = RecurrentLayer::new(3, 2, ActivationFunction::Sigmoid, &mut rng);
    let seqs = (0..2).map(|_| random_sequence(&mut rng, 6, 2, 3)).collect();
    let ds = SequenceDataset::from_sequences(2, 3, seqs).expect("valid dataset");

    let trainer = BackpropTrainer::new(TrainConfig::default()).expect("valid config");
    for per_param in trainer.check_gradient(&mut layer, &ds).expect("gradient check should run") {
        for c in per_param {
            assert!(c.agrees(REL_TOLERANCE), "{c:?}");
        }
    }
}

#[test]
fn test_batch_of_one_equivalence_for_recurrent_module() {
    let mut rng = StdRng::seed_from_u64(5);
    let seq = random_sequence(&mut rng, 5, 1, 2);
    let ds = SequenceDataset::from_sequences(1, 2, vec![seq]).expect("valid dataset");
    let template = RecurrentLayer::new(2, 1, ActivationFunction::Tanh, &mut rng);

    let config = TrainConfig::new().learning_rate(0.1).momentum(0.3);
    let mut online_layer = template.clone();
    let mut batch_layer = template;
    let mut online = BackpropTrainer::new(config.clone()).expect("valid config");
    let mut batch = BackpropTrainer::new(config.batch_learning(true)).expect("valid config");

    for _ in 0..4 {
        online.train_epoch(&mut online_layer, &ds).expect("online epoch");
        batch.train_epoch(&mut batch_layer, &ds).expect("batch epoch");
    }
    assert_eq!(online_layer.params(), batch_layer.params());
}

#[test]
fn test_dimension_mismatch_surfaces_as_structural_error() {
    let seq = Sequence::from_pairs(vec![vec![1.0, 2.0]], vec![vec![1.0]]).expect("valid sequence");
    let ds = SequenceDataset::from_sequences(2, 1, vec![seq]).expect("valid dataset");
    let mut trainer = BackpropTrainer::new(TrainConfig::default()).expect("valid config");

    let err = trainer.train_epoch(&mut sigmoid_unit(&[0.0, 0.0]), &ds).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Structural);
    assert!(matches!(err, TrainError::ShapeMismatch { expected: 1, actual: 2, .. }));
}

#[test]
fn test_nan_in_validation_aborts_without_history() {
    let training = xor_like_sequence();
    let poisoned = Sequence::new(vec![Sample::new(vec![1.0], vec![f64::NAN])]).expect("valid sequence");
    let validation = SequenceDataset::from_sequences(1, 1, vec![poisoned]).expect("valid dataset");

    let mut module = sigmoid_unit(&[0.5, 0.5]);
    let mut trainer = BackpropTrainer::new(TrainConfig::default()).expect("valid config");
    let (tx, rx) = mpsc::channel();
    let config = ConvergenceConfig::new().max_epochs(10).progress(tx);
    let err = trainer
        .train_until_convergence_on(&mut module, &training, &validation, &config)
        .unwrap_err();
    drop(config);

    assert_eq!(err.kind(), ErrorKind::NumericDivergence);
    assert_eq!(rx.iter().count(), 0);
    assert_eq!(module.params(), &[0.5, 0.5]);
}
