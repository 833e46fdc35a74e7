mod manhattan;
mod momentum;
mod optimizer;
mod rprop;

pub use manhattan::{DEFAULT_ZERO_TOLERANCE, Manhattan};
pub use momentum::Momentum;
pub use optimizer::Optimizer;
pub use rprop::{Rprop, RpropConfig, ZeroCrossing};
