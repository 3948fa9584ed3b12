use rand::{rngs::StdRng, SeedableRng};

use ferrite_bptt::{ActivationFunction, BackpropTrainer, Network, Sequence, SequenceDataset, TrainConfig};

fn main() -> ferrite_bptt::Result<()> {
    let mut network = Network::new(
        vec![
            (2, 2, ActivationFunction::Sigmoid),
            (1, 2, ActivationFunction::Sigmoid),
        ],
        &mut StdRng::seed_from_u64(1),
    )?;

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];

    // One sequence per sample: the network is feed-forward.
    let mut dataset = SequenceDataset::new(2, 1);
    for (input, expected) in inputs.iter().zip(&expected_outputs) {
        dataset.add_sequence(Sequence::from_pairs(vec![input.clone()], vec![expected.clone()])?)?;
    }

    let mut trainer = BackpropTrainer::new(TrainConfig::new().learning_rate(0.5).momentum(0.9))?;
    let epochs = 5000;

    for epoch in 0..epochs {
        let error = trainer.train_epoch(&mut network, &dataset)?;
        if epoch % 500 == 0 {
            println!("Epoch {epoch}: error = {error:.6}");
        }
    }

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, network.forward(input)?[0]);
    }
    Ok(())
}
