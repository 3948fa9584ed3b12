use thiserror::Error;

/// Result type used across the training engine.
pub type Result<T> = std::result::Result<T, TrainError>;

/// Broad classification of a `TrainError`.
///
/// - `Configuration`: the run was set up wrongly (empty data, bad split).
/// - `NumericDivergence`: an epoch produced NaN; the run cannot recover.
/// - `Structural`: vectors of the wrong shape reached the module, or no
///   sample contributed to an error mean.
/// - `Io`: reading or writing a configuration file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    NumericDivergence,
    Structural,
    Io,
}

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("dataset contains no sequences")]
    EmptyDataset,

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("dataset too small to be split into training and validation sets with proportion {proportion}")]
    SplitTooSmall { proportion: f64 },

    #[error("training produced NaN results at epoch {epoch} (training error {training_error}, validation error {validation_error})")]
    NumericDivergence {
        epoch: usize,
        training_error: f64,
        validation_error: f64,
    },

    #[error("shape mismatch for {what}: expected {expected}, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("no sample contributed to the error (total ponderation is zero)")]
    ZeroPonderation,

    #[error("invalid sequence: {message}")]
    InvalidSequence { message: String },

    #[error("time index violation: {message}")]
    TimeIndex { message: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrainError::EmptyDataset
            | TrainError::InvalidConfig { .. }
            | TrainError::SplitTooSmall { .. } => ErrorKind::Configuration,
            TrainError::NumericDivergence { .. } => ErrorKind::NumericDivergence,
            TrainError::ShapeMismatch { .. }
            | TrainError::ZeroPonderation
            | TrainError::InvalidSequence { .. }
            | TrainError::TimeIndex { .. } => ErrorKind::Structural,
            TrainError::Io(_) | TrainError::Serialization(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        TrainError::InvalidConfig { message: message.into() }
    }

    /// Returns `ShapeMismatch` unless `actual == expected`.
    pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(TrainError::ShapeMismatch { what, expected, actual })
        }
    }
}
