pub mod error_fn;

pub use error_fn::ErrorFunction;
