// Trains a small network on a seeded XOR dataset until the validation error
// converges, logging progress through env_logger:
//   RUST_LOG=debug cargo run -- [train_config.json]
use rand::{rngs::StdRng, SeedableRng};

use ferrite_bptt::{
    ActivationFunction, BackpropTrainer, ConvergenceConfig, Network, Result, Sequence,
    SequenceDataset, TrainConfig,
};

fn xor_dataset() -> Result<SequenceDataset> {
    let mut ds = SequenceDataset::new(2, 1);
    for _ in 0..8 {
        for (a, b) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
            let target = if a != b { 1.0 } else { 0.0 };
            ds.add_sequence(Sequence::from_pairs(vec![vec![a, b]], vec![vec![target]])?)?;
        }
    }
    Ok(ds)
}

fn main() -> Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => TrainConfig::load_json(&path)?,
        None => TrainConfig::new().learning_rate(0.5).momentum(0.5).seed(7),
    };
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut network = Network::new(
        vec![
            (3, 2, ActivationFunction::Tanh),
            (1, 3, ActivationFunction::Sigmoid),
        ],
        &mut rng,
    )?;

    let dataset = xor_dataset()?;
    let mut trainer = BackpropTrainer::new(config)?;
    let report = trainer.train_until_convergence(
        &mut network,
        &dataset,
        &ConvergenceConfig::new().max_epochs(500).continue_epochs(10),
    )?;

    log::info!(
        "{:?} after {} epochs, best validation error {:.6} at epoch {}",
        report.stop_reason,
        report.epochs_trained,
        report.best_validation_error,
        report.best_epoch
    );
    for (a, b) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
        log::info!("{} xor {} -> {:.4}", a, b, network.forward(&[a, b])?[0]);
    }
    Ok(())
}
