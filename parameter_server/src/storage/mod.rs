mod accumulator;
mod error;
mod store;

pub use accumulator::{GradientAccumulator, Totals};
pub use error::{Result, SizeMismatchErr};
pub use store::ParameterStore;
