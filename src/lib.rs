pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod data;
pub mod loss;
pub mod optim;
pub mod train;

// Convenience re-exports
pub use error::{ErrorKind, Result, TrainError};
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use layers::recurrent::RecurrentLayer;
pub use network::module::Module;
pub use network::network::Network;
pub use data::{Sample, Sequence, SequenceDataset};
pub use loss::error_fn::ErrorFunction;
pub use optim::gradient_descent::GradientDescent;
pub use train::{
    BackpropTrainer, ConvergenceConfig, ConvergenceReport, EpochStats, StopReason, TrainConfig,
};
