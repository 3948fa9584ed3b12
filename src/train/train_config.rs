use std::sync::mpsc;
use std::sync::{Arc, atomic::AtomicBool};
use serde::{Serialize, Deserialize};
use crate::error::{Result, TrainError};
use crate::train::epoch_stats::EpochStats;

/// Hyperparameters of a `BackpropTrainer`.
///
/// # Fields
/// - `learning_rate`: step size of the first optimizer call
/// - `lr_decay`: learning rate multiplier applied after every optimizer call
/// - `momentum`: fraction of the previous step added to the next one
/// - `batch_learning`: `true` updates once per epoch, `false` after every sequence
/// - `weight_decay`: L2 shrinkage applied to online updates
/// - `seed`: seed of the trainer's random source (sequence shuffling
///   and dataset splits)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub learning_rate: f64,
    pub lr_decay: f64,
    pub momentum: f64,
    pub batch_learning: bool,
    pub weight_decay: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            learning_rate: 0.01,
            lr_decay: 1.0,
            momentum: 0.0,
            batch_learning: false,
            weight_decay: 0.0,
            seed: 0,
        }
    }
}

impl TrainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn lr_decay(mut self, lr_decay: f64) -> Self {
        self.lr_decay = lr_decay;
        self
    }

    pub fn momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn batch_learning(mut self, batch_learning: bool) -> Self {
        self.batch_learning = batch_learning;
        self
    }

    pub fn weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let values = [
            ("learning_rate", self.learning_rate),
            ("lr_decay", self.lr_decay),
            ("momentum", self.momentum),
            ("weight_decay", self.weight_decay),
        ];
        for (name, value) in values {
            if !value.is_finite() {
                return Err(TrainError::invalid_config(format!("{name} must be finite, got {value}")));
            }
        }
        Ok(())
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Reads a config from JSON; missing fields take their default values.
    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

/// Settings of a `train_until_convergence` run.
///
/// # Fields
/// - `max_epochs`: optional hard limit on the number of epochs trained
/// - `continue_epochs`: width of the look-back window of the stop rule
/// - `validation_proportion`: share of sequences held out for validation when
///   no explicit split is given; must lie in (0, 1)
/// - `convergence_precision`: decimal digits used by the plateau test
/// - `progress_tx`: optional channel sender; one `EpochStats` is sent per
///   completed epoch. If the receiver is dropped the run stops
///   at the next epoch boundary.
/// - `stop_flag`: optional atomic flag checked before every epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    pub max_epochs: Option<usize>,
    pub continue_epochs: usize,
    pub validation_proportion: f64,
    pub convergence_precision: u32,
    #[serde(skip)]
    pub progress_tx: Option<mpsc::Sender<EpochStats>>,
    #[serde(skip)]
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        ConvergenceConfig {
            max_epochs: None,
            continue_epochs: 10,
            validation_proportion: 0.25,
            convergence_precision: 10,
            progress_tx: None,
            stop_flag: None,
        }
    }
}

impl ConvergenceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = Some(max_epochs);
        self
    }

    pub fn continue_epochs(mut self, continue_epochs: usize) -> Self {
        self.continue_epochs = continue_epochs;
        self
    }

    pub fn validation_proportion(mut self, proportion: f64) -> Self {
        self.validation_proportion = proportion;
        self
    }

    pub fn convergence_precision(mut self, digits: u32) -> Self {
        self.convergence_precision = digits;
        self
    }

    pub fn progress(mut self, tx: mpsc::Sender<EpochStats>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.continue_epochs == 0 {
            return Err(TrainError::invalid_config("continue_epochs must be at least 1"));
        }
        if !(self.validation_proportion > 0.0 && self.validation_proportion < 1.0) {
            return Err(TrainError::invalid_config(format!(
                "validation_proportion must lie in (0, 1), got {}",
                self.validation_proportion
            )));
        }
        Ok(())
    }
}
