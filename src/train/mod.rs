pub mod backprop;
pub mod trainer;
pub mod epoch_stats;
pub mod train_config;
pub mod loop_fn;

pub use backprop::process_sequence;
pub use trainer::{BackpropTrainer, GradientCheck};
pub use epoch_stats::EpochStats;
pub use train_config::{ConvergenceConfig, TrainConfig};
pub use loop_fn::{convergence_check, ConvergenceReport, StopReason};
