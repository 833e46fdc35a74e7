mod builder;
mod coordinator;
pub mod error;
pub mod specs;
mod trainer;

pub use builder::TrainerBuilder;
pub use coordinator::{Coordinator, CoordinatorConfig};
pub use error::{ConfigErr, Result, TrainErr};
pub use trainer::{StopCondition, TrainReport, Trainer};
