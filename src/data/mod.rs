pub mod dataset;
pub mod sequence;

pub use dataset::SequenceDataset;
pub use sequence::{Sample, Sequence};
