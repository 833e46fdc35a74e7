mod backprop;
mod cancel;
pub mod error;
mod gradient;
mod partition;
mod stats;

pub use backprop::BackpropWorker;
pub use cancel::CancelToken;
pub use error::{Result, WorkerErr};
pub use gradient::{Gradient, GradientWorker};
pub use partition::{WorkRange, partition};
pub use stats::StepStats;
