pub mod dense;
pub mod recurrent;

pub use dense::Layer;
pub use recurrent::RecurrentLayer;
