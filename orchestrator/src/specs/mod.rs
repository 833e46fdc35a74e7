mod dataset;
mod layer;
mod param_gen;
mod strategy;
mod trainer;

pub use dataset::DatasetSpec;
pub use layer::LayerSpec;
pub use param_gen::{DistributionSpec, ParamGenSpec};
pub use strategy::{RpropSpec, StrategySpec, ZeroCrossingSpec};
pub use trainer::TrainerSpec;
