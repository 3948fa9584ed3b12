pub mod module;
pub mod network;
pub mod trace;

pub use module::Module;
pub use network::Network;
pub use trace::{Phase, StepTrace};
