use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use super::{DatasetSpec, LayerSpec, ParamGenSpec, StrategySpec};
use crate::StopCondition;

/// The specification for a whole training session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerSpec {
    pub layers: Vec<LayerSpec>,
    pub strategy: StrategySpec,
    #[serde(default)]
    pub param_gen: Option<ParamGenSpec>,
    pub dataset: DatasetSpec,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub shard_size: Option<NonZeroUsize>,
    pub max_iterations: usize,
    #[serde(default)]
    pub target_error: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl TrainerSpec {
    pub fn stop_condition(&self) -> StopCondition {
        StopCondition {
            max_iterations: self.max_iterations,
            target_error: self.target_error,
        }
    }
}
